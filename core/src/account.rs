use alloy::primitives::Address;
use chrono::{DateTime, Local};

use crate::resolve::IntoAddress;

#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotRecord {
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

/// An account-token pair and the balances recorded for it so far, oldest first.
#[derive(Clone, Debug)]
pub struct SnapshotAccount {
    pub account_address: Address,
    pub contract_address: Address,
    pub snapshot_records: Vec<SnapshotRecord>,
}

impl SnapshotAccount {
    pub fn new(account: impl IntoAddress, contract: impl IntoAddress) -> crate::Result<Self> {
        Ok(Self {
            account_address: account.into_address()?,
            contract_address: contract.into_address()?,
            snapshot_records: Vec::new(),
        })
    }

    pub fn is_same_pair(&self, other: &SnapshotAccount) -> bool {
        self.account_address == other.account_address
            && self.contract_address == other.contract_address
    }

    /// Records `balance` as of now.
    pub fn add_balance(&mut self, balance: f64) {
        self.add_balance_at(Local::now(), balance);
    }

    pub fn add_balance_at(&mut self, timestamp: DateTime<Local>, balance: f64) {
        self.snapshot_records.push(SnapshotRecord {
            timestamp,
            value: balance,
        });
    }

    pub fn latest(&self) -> Option<&SnapshotRecord> {
        self.snapshot_records.last()
    }
}

/// Pairs every account with every contract, accounts in the outer loop.
pub fn create_snapshot_accounts<A, C>(
    accounts: impl IntoIterator<Item = A>,
    contracts: impl IntoIterator<Item = C>,
) -> crate::Result<Vec<SnapshotAccount>>
where
    A: IntoAddress,
    C: IntoAddress,
{
    let accounts = accounts
        .into_iter()
        .map(IntoAddress::into_address)
        .collect::<crate::Result<Vec<_>>>()?;
    let contracts = contracts
        .into_iter()
        .map(IntoAddress::into_address)
        .collect::<crate::Result<Vec<_>>>()?;

    let mut snapshot_accounts = Vec::with_capacity(accounts.len() * contracts.len());
    for account in &accounts {
        for contract in &contracts {
            snapshot_accounts.push(SnapshotAccount::new(account, contract)?);
        }
    }
    Ok(snapshot_accounts)
}
