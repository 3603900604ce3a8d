pub mod erc20;
pub mod multicall;
pub mod text_truncate;

pub use text_truncate::abstract_address;
