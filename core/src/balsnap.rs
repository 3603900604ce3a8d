use std::collections::HashMap;

use alloy::primitives::{utils::format_units, Address, U256};
use balsnap_common::{abstract_address, multicall::MAINNET_MULTICALL2_ADDRESS};
use chrono::{DateTime, Local};

use crate::{
    account::SnapshotAccount,
    reader::{ContractInfo, TokenReader},
    table::Table,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keeps the account-token pairs to snapshot and the metadata of their tokens.
pub struct BalSnap<R> {
    reader: R,
    multicall_address: Address,
    snapshot_accounts: Vec<SnapshotAccount>,
    contract_info: HashMap<Address, ContractInfo>,
}

impl<R: TokenReader> BalSnap<R> {
    /// Without a multicall address the mainnet Multicall2 deployment is used.
    pub fn new(reader: R, multicall_address: Option<Address>) -> Self {
        let multicall_address = multicall_address.unwrap_or_else(|| {
            log::warn!(
                "multicall contract address is not configured, \
                 defaulting to mainnet multicall2 contract address: {MAINNET_MULTICALL2_ADDRESS}"
            );
            MAINNET_MULTICALL2_ADDRESS
        });

        Self {
            reader,
            multicall_address,
            snapshot_accounts: Vec::new(),
            contract_info: HashMap::new(),
        }
    }

    pub fn multicall_address(&self) -> Address {
        self.multicall_address
    }

    pub fn snapshot_accounts(&self) -> &[SnapshotAccount] {
        &self.snapshot_accounts
    }

    pub fn contract_info(&self, contract: &Address) -> Option<&ContractInfo> {
        self.contract_info.get(contract)
    }

    pub fn contract_name(&self, contract: &Address) -> Option<&str> {
        self.contract_info(contract).map(|info| info.name.as_str())
    }

    pub fn contract_symbol(&self, contract: &Address) -> Option<&str> {
        self.contract_info(contract).map(|info| info.symbol.as_str())
    }

    pub fn contract_decimals(&self, contract: &Address) -> Option<u8> {
        self.contract_info(contract).map(|info| info.decimals)
    }

    /// Adds the pair unless it is already present, fetching the token metadata
    /// the first time a token shows up. Returns whether the pair was added.
    pub async fn add_snapshot_account(
        &mut self,
        snapshot_account: SnapshotAccount,
    ) -> crate::Result<bool> {
        if self
            .snapshot_accounts
            .iter()
            .any(|existing| existing.is_same_pair(&snapshot_account))
        {
            return Ok(false);
        }

        self.retrieve_contract_info(snapshot_account.contract_address)
            .await?;
        self.snapshot_accounts.push(snapshot_account);
        Ok(true)
    }

    /// Adds pairs in order, returns how many were new.
    pub async fn add_snapshot_accounts(
        &mut self,
        snapshot_accounts: impl IntoIterator<Item = SnapshotAccount>,
    ) -> crate::Result<usize> {
        let mut added = 0;
        for snapshot_account in snapshot_accounts {
            if self.add_snapshot_account(snapshot_account).await? {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn retrieve_contract_info(&mut self, contract: Address) -> crate::Result<()> {
        if !self.contract_info.contains_key(&contract) {
            let info = self.reader.token_info(contract).await?;
            log::info!(
                "tracking {} ({}) at {contract} with {} decimals",
                info.name,
                info.symbol,
                info.decimals
            );
            self.contract_info.insert(contract, info);
        }
        Ok(())
    }

    /// Tokens of the held pairs, in the order they were first added.
    fn contracts(&self) -> Vec<Address> {
        let mut contracts: Vec<Address> = Vec::new();
        for snapshot_account in &self.snapshot_accounts {
            if !contracts.contains(&snapshot_account.contract_address) {
                contracts.push(snapshot_account.contract_address);
            }
        }
        contracts
    }

    /// Records the current balance of every pair, one multicall per token.
    pub async fn snapshot(&mut self) -> crate::Result<()> {
        self.snapshot_at(Local::now()).await
    }

    /// Same as [`BalSnap::snapshot`] with every new record stamped `timestamp`.
    ///
    /// A failed multicall stops the pass with an error, tokens handled before
    /// it keep their new records. A single `balanceOf` that reverts only
    /// skips that pair.
    pub async fn snapshot_at(&mut self, timestamp: DateTime<Local>) -> crate::Result<()> {
        for contract in self.contracts() {
            let decimals = self
                .contract_decimals(&contract)
                .ok_or(crate::Error::MissingContractInfo(contract))?;

            let accounts: Vec<Address> = self
                .snapshot_accounts
                .iter()
                .filter(|sa| sa.contract_address == contract)
                .map(|sa| sa.account_address)
                .collect();

            let balances = self
                .reader
                .balances_of(self.multicall_address, contract, &accounts)
                .await?;
            if balances.len() != accounts.len() {
                return Err(crate::Error::MulticallResultCount {
                    contract,
                    expected: accounts.len(),
                    returned: balances.len(),
                });
            }

            let group = self
                .snapshot_accounts
                .iter_mut()
                .filter(|sa| sa.contract_address == contract);
            for (snapshot_account, balance) in group.zip(balances) {
                match balance {
                    Some(raw) => {
                        snapshot_account.add_balance_at(timestamp, to_decimal(raw, decimals)?)
                    }
                    None => log::warn!(
                        "balanceOf({}) reverted on token {contract}, no record taken",
                        snapshot_account.account_address
                    ),
                }
            }
        }
        Ok(())
    }

    /// Table of the latest record of every pair, see [`TableOptions`] for
    /// filtering. Pairs without a record or with a balance of zero are left out.
    pub fn render_table(&self, options: &TableOptions) -> Table {
        let mut table = Table::new(["Account", "Contract", "Balance", "Time"]);

        for snapshot_account in &self.snapshot_accounts {
            let Some(latest) = snapshot_account.latest() else {
                continue;
            };
            if latest.value <= 0.0 {
                continue;
            }

            let account_address = snapshot_account.account_address;
            let contract_address = snapshot_account.contract_address;
            if !options.includes(&account_address, &contract_address) {
                continue;
            }

            let symbol = self.contract_symbol(&contract_address).unwrap_or("?");
            table.add_row([
                abstract_address(&account_address.to_checksum(None), options.abstract_digits),
                format!(
                    "{symbol}({})",
                    abstract_address(&contract_address.to_checksum(None), options.abstract_digits)
                ),
                latest.value.to_string(),
                latest.timestamp.format(TIME_FORMAT).to_string(),
            ]);
        }

        table
    }

    pub fn print_table(&self, options: &TableOptions) {
        println!("{}", self.render_table(options));
    }
}

/// `raw / 10^decimals`
pub fn to_decimal(raw: U256, decimals: u8) -> crate::Result<f64> {
    Ok(format_units(raw, decimals)?.parse::<f64>()?)
}

/// One address or a set of addresses.
#[derive(Clone, Debug, PartialEq)]
pub enum AddressFilter {
    One(Address),
    Many(Vec<Address>),
}

impl AddressFilter {
    pub fn contains(&self, address: &Address) -> bool {
        match self {
            AddressFilter::One(one) => one == address,
            AddressFilter::Many(many) => many.contains(address),
        }
    }
}

impl From<Address> for AddressFilter {
    fn from(address: Address) -> Self {
        AddressFilter::One(address)
    }
}

impl From<Vec<Address>> for AddressFilter {
    fn from(addresses: Vec<Address>) -> Self {
        AddressFilter::Many(addresses)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableOptions {
    /// Characters kept on each side of an abbreviated address, `None` shows
    /// addresses in full.
    pub abstract_digits: Option<usize>,
    /// Only show these accounts.
    pub accounts: Option<AddressFilter>,
    /// Only show these tokens.
    pub contracts: Option<AddressFilter>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            abstract_digits: Some(4),
            accounts: None,
            contracts: None,
        }
    }
}

impl TableOptions {
    pub fn with_digits(mut self, digits: Option<usize>) -> Self {
        self.abstract_digits = digits;
        self
    }

    pub fn only_accounts(mut self, accounts: impl Into<AddressFilter>) -> Self {
        self.accounts = Some(accounts.into());
        self
    }

    pub fn only_contracts(mut self, contracts: impl Into<AddressFilter>) -> Self {
        self.contracts = Some(contracts.into());
        self
    }

    fn includes(&self, account: &Address, contract: &Address) -> bool {
        self.accounts
            .as_ref()
            .is_none_or(|filter| filter.contains(account))
            && self
                .contracts
                .as_ref()
                .is_none_or(|filter| filter.contains(contract))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy::primitives::address;
    use chrono::TimeZone;

    use super::*;
    use crate::account::create_snapshot_accounts;

    const ACCOUNT_1: Address = address!("F5D6849f0d1D5E84b047F157990cF016c046a433");
    const ACCOUNT_2: Address = address!("43CC25B1fB6435d8d893fCf308de5C300a568BE2");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    const MULTICALL: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

    #[derive(Default)]
    struct MockReader {
        infos: HashMap<Address, ContractInfo>,
        balances: HashMap<(Address, Address), Option<U256>>,
        short_results_for: Option<Address>,
        info_calls: AtomicUsize,
        balance_calls: AtomicUsize,
    }

    impl MockReader {
        fn with_token(mut self, address: Address, symbol: &str, decimals: u8) -> Self {
            self.infos.insert(
                address,
                ContractInfo {
                    address,
                    name: format!("{symbol} token"),
                    symbol: symbol.to_string(),
                    decimals,
                },
            );
            self
        }

        fn with_balance(mut self, account: Address, contract: Address, raw: u128) -> Self {
            self.balances
                .insert((account, contract), Some(U256::from(raw)));
            self
        }

        fn with_revert(mut self, account: Address, contract: Address) -> Self {
            self.balances.insert((account, contract), None);
            self
        }
    }

    impl TokenReader for MockReader {
        async fn token_info(&self, contract: Address) -> crate::Result<ContractInfo> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            self.infos
                .get(&contract)
                .cloned()
                .ok_or(crate::Error::MissingContractInfo(contract))
        }

        async fn balances_of(
            &self,
            multicall: Address,
            contract: Address,
            accounts: &[Address],
        ) -> crate::Result<Vec<Option<U256>>> {
            assert_eq!(multicall, MULTICALL);
            self.balance_calls.fetch_add(1, Ordering::SeqCst);

            let mut balances: Vec<Option<U256>> = accounts
                .iter()
                .map(|account| {
                    self.balances
                        .get(&(*account, contract))
                        .copied()
                        .unwrap_or(Some(U256::ZERO))
                })
                .collect();
            if self.short_results_for == Some(contract) {
                balances.pop();
            }
            Ok(balances)
        }
    }

    fn mock() -> MockReader {
        MockReader::default()
            .with_token(DAI, "DAI", 18)
            .with_token(USDC, "USDC", 6)
    }

    fn at_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2021, 9, 1, 12, 0, 0).unwrap()
    }

    fn values(balsnap: &BalSnap<MockReader>) -> Vec<Vec<f64>> {
        balsnap
            .snapshot_accounts()
            .iter()
            .map(|sa| sa.snapshot_records.iter().map(|r| r.value).collect())
            .collect()
    }

    #[test]
    fn test_default_multicall_address() {
        let balsnap = BalSnap::new(mock(), None);
        assert_eq!(balsnap.multicall_address(), MAINNET_MULTICALL2_ADDRESS);

        let balsnap = BalSnap::new(mock(), Some(MULTICALL));
        assert_eq!(balsnap.multicall_address(), MULTICALL);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(U256::from(1_500_000u64), 6).unwrap(), 1.5);
        assert_eq!(
            to_decimal(U256::from(2_500_000_000_000_000_000u128), 18).unwrap(),
            2.5
        );
        assert_eq!(to_decimal(U256::from(42u64), 0).unwrap(), 42.0);
        assert_eq!(to_decimal(U256::ZERO, 18).unwrap(), 0.0);
    }

    #[test]
    fn test_balance_parse_error() {
        let error: crate::Error = "1.5e".parse::<f64>().unwrap_err().into();
        assert!(matches!(error, crate::Error::BalanceParse(_)));
    }

    #[tokio::test]
    async fn test_add_same_pair_twice() {
        let mut balsnap = BalSnap::new(mock(), Some(MULTICALL));

        let first = SnapshotAccount::new(ACCOUNT_1, DAI).unwrap();
        let again = SnapshotAccount::new("0xf5d6849f0d1d5e84b047f157990cf016c046a433", DAI).unwrap();

        assert!(balsnap.add_snapshot_account(first).await.unwrap());
        assert!(!balsnap.add_snapshot_account(again).await.unwrap());
        assert_eq!(balsnap.snapshot_accounts().len(), 1);
        assert_eq!(balsnap.reader.info_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_metadata_fetched_once_per_token() {
        let mut balsnap = BalSnap::new(mock(), Some(MULTICALL));
        let pairs = create_snapshot_accounts([ACCOUNT_1, ACCOUNT_2], [DAI, USDC]).unwrap();

        assert_eq!(balsnap.add_snapshot_accounts(pairs.clone()).await.unwrap(), 4);
        assert_eq!(balsnap.add_snapshot_accounts(pairs).await.unwrap(), 0);

        assert_eq!(balsnap.reader.info_calls.load(Ordering::SeqCst), 2);
        assert_eq!(balsnap.contract_symbol(&USDC), Some("USDC"));
        assert_eq!(balsnap.contract_name(&DAI), Some("DAI token"));
        assert_eq!(balsnap.contract_decimals(&DAI), Some(18));
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_added() {
        let mut balsnap = BalSnap::new(MockReader::default(), Some(MULTICALL));
        let pair = SnapshotAccount::new(ACCOUNT_1, DAI).unwrap();

        assert!(balsnap.add_snapshot_account(pair).await.is_err());
        assert!(balsnap.snapshot_accounts().is_empty());
        assert!(balsnap.contract_info(&DAI).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_records_once_per_pair() {
        let reader = mock()
            .with_balance(ACCOUNT_1, DAI, 2_500_000_000_000_000_000)
            .with_balance(ACCOUNT_1, USDC, 1_500_000)
            .with_balance(ACCOUNT_2, USDC, 7);
        let mut balsnap = BalSnap::new(reader, Some(MULTICALL));
        let pairs = create_snapshot_accounts([ACCOUNT_1, ACCOUNT_2], [DAI, USDC]).unwrap();
        balsnap.add_snapshot_accounts(pairs).await.unwrap();

        balsnap.snapshot_at(at_noon()).await.unwrap();

        assert_eq!(balsnap.reader.balance_calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            values(&balsnap),
            vec![vec![2.5], vec![1.5], vec![0.0], vec![0.000007]]
        );
        assert!(balsnap
            .snapshot_accounts()
            .iter()
            .all(|sa| sa.latest().unwrap().timestamp == at_noon()));

        balsnap.snapshot().await.unwrap();
        assert!(balsnap
            .snapshot_accounts()
            .iter()
            .all(|sa| sa.snapshot_records.len() == 2));
    }

    #[tokio::test]
    async fn test_reverted_balance_only_skips_its_pair() {
        let reader = mock()
            .with_balance(ACCOUNT_1, DAI, 1_000_000_000_000_000_000)
            .with_revert(ACCOUNT_2, DAI);
        let mut balsnap = BalSnap::new(reader, Some(MULTICALL));
        let pairs = create_snapshot_accounts([ACCOUNT_1, ACCOUNT_2], [DAI]).unwrap();
        balsnap.add_snapshot_accounts(pairs).await.unwrap();

        balsnap.snapshot_at(at_noon()).await.unwrap();

        assert_eq!(values(&balsnap), vec![vec![1.0], vec![]]);
    }

    #[tokio::test]
    async fn test_failed_group_stops_snapshot() {
        let reader = MockReader {
            short_results_for: Some(USDC),
            ..mock().with_balance(ACCOUNT_1, DAI, 1_000_000_000_000_000_000)
        };
        let mut balsnap = BalSnap::new(reader, Some(MULTICALL));
        let pairs = create_snapshot_accounts([ACCOUNT_1], [DAI, USDC]).unwrap();
        balsnap.add_snapshot_accounts(pairs).await.unwrap();

        let result = balsnap.snapshot_at(at_noon()).await;

        assert!(matches!(
            result,
            Err(crate::Error::MulticallResultCount {
                contract,
                expected: 1,
                returned: 0,
            }) if contract == USDC
        ));
        assert_eq!(values(&balsnap), vec![vec![1.0], vec![]]);
    }

    async fn two_by_two() -> BalSnap<MockReader> {
        let reader = mock()
            .with_balance(ACCOUNT_1, DAI, 2_500_000_000_000_000_000)
            .with_balance(ACCOUNT_1, USDC, 1_500_000)
            .with_balance(ACCOUNT_2, DAI, 1_000_000_000_000_000_000)
            .with_balance(ACCOUNT_2, USDC, 0);
        let mut balsnap = BalSnap::new(reader, Some(MULTICALL));
        let pairs = create_snapshot_accounts([ACCOUNT_1, ACCOUNT_2], [DAI, USDC]).unwrap();
        balsnap.add_snapshot_accounts(pairs).await.unwrap();
        balsnap.snapshot_at(at_noon()).await.unwrap();
        balsnap
    }

    #[tokio::test]
    async fn test_table_skips_non_positive_balances() {
        let balsnap = two_by_two().await;

        let table = balsnap.render_table(&TableOptions::default());

        assert_eq!(table.len(), 3);
        let rendered = table.to_string();
        let row = rendered
            .lines()
            .find(|line| line.contains("0xF5D6...a433") && line.contains("DAI(0x6B17...1d0F)"))
            .unwrap();
        assert!(row.contains(" 2.5 "));
        assert!(row.contains(" 2021-09-01 12:00:00 "));
        assert!(rendered.contains("USDC(0xA0b8...eB48)"));
        assert_eq!(rendered.matches("0x43CC...8BE2").count(), 1);
    }

    #[tokio::test]
    async fn test_table_before_snapshot_is_empty() {
        let mut balsnap = BalSnap::new(mock(), Some(MULTICALL));
        balsnap
            .add_snapshot_account(SnapshotAccount::new(ACCOUNT_1, DAI).unwrap())
            .await
            .unwrap();

        assert!(balsnap.render_table(&TableOptions::default()).is_empty());
    }

    #[tokio::test]
    async fn test_table_filters() {
        let balsnap = two_by_two().await;

        let only_account_2 = TableOptions::default().only_accounts(ACCOUNT_2);
        assert_eq!(balsnap.render_table(&only_account_2).len(), 1);

        let only_usdc = TableOptions::default().only_contracts(vec![USDC]);
        assert_eq!(balsnap.render_table(&only_usdc).len(), 1);

        let both_tokens = TableOptions::default().only_contracts(vec![DAI, USDC]);
        assert_eq!(balsnap.render_table(&both_tokens).len(), 3);

        let account_1_dai = TableOptions::default()
            .only_accounts(vec![ACCOUNT_1])
            .only_contracts(DAI);
        assert_eq!(balsnap.render_table(&account_1_dai).len(), 1);

        let nobody = TableOptions::default().only_accounts(Vec::<Address>::new());
        assert!(balsnap.render_table(&nobody).is_empty());
    }

    #[tokio::test]
    async fn test_table_full_addresses() {
        let balsnap = two_by_two().await;

        let rendered = balsnap
            .render_table(&TableOptions::default().with_digits(None))
            .to_string();

        assert!(rendered.contains("0xF5D6849f0d1D5E84b047F157990cF016c046a433"));
        assert!(rendered.contains("DAI(0x6B175474E89094C44Da98b954EedeAC495271d0F)"));
    }
}
