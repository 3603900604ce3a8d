pub mod alloy;
pub mod config;
pub mod disk_storage;
pub mod error;
pub mod network;

pub use error::{Result, UtilsError as Error};
