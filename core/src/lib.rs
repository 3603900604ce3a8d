//! Takes balance snapshots of many (account, ERC20 token) pairs at once.
//!
//! Pairs are added to a [`BalSnap`], which caches the metadata of every token
//! it sees. Each [`BalSnap::snapshot`] reads all balances of one token in a
//! single multicall round-trip and appends a timestamped record to every pair,
//! and [`BalSnap::print_table`] shows the latest record of each pair.

pub mod account;
pub mod balsnap;
pub mod error;
pub mod reader;
pub mod resolve;
pub mod table;

pub use account::{create_snapshot_accounts, SnapshotAccount, SnapshotRecord};
pub use balsnap::{AddressFilter, BalSnap, TableOptions};
pub use error::{Error, Result};
pub use reader::{ContractInfo, ProviderTokenReader, TokenReader};
pub use resolve::IntoAddress;
