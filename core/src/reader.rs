use std::future::Future;

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{Dynamic, MulticallBuilder, Provider},
};
use balsnap_common::erc20::IERC20::{self, balanceOfCall};

/// Metadata of an ERC20 token, read once per token and then kept.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Chain access needed to take snapshots.
pub trait TokenReader {
    fn token_info(
        &self,
        contract: Address,
    ) -> impl Future<Output = crate::Result<ContractInfo>> + Send;

    /// Reads `balanceOf` of every account in one round-trip through the
    /// multicall contract, in the order of `accounts`. A `None` marks a call
    /// that reverted.
    fn balances_of(
        &self,
        multicall: Address,
        contract: Address,
        accounts: &[Address],
    ) -> impl Future<Output = crate::Result<Vec<Option<U256>>>> + Send;
}

pub struct ProviderTokenReader<P> {
    provider: P,
}

impl<P: Provider> ProviderTokenReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: Provider> TokenReader for ProviderTokenReader<P> {
    async fn token_info(&self, contract: Address) -> crate::Result<ContractInfo> {
        let token = IERC20::new(contract, &self.provider);
        let fetch_failed = |field: &'static str| {
            move |error: alloy::contract::Error| crate::Error::TokenInfoFetchFailed {
                contract,
                field,
                error: Box::new(error),
            }
        };

        log::debug!("fetching metadata of token {contract}");
        let name = token.name().call().await.map_err(fetch_failed("name"))?;
        let symbol = token.symbol().call().await.map_err(fetch_failed("symbol"))?;
        let decimals = token
            .decimals()
            .call()
            .await
            .map_err(fetch_failed("decimals"))?;

        Ok(ContractInfo {
            address: contract,
            name,
            symbol,
            decimals,
        })
    }

    async fn balances_of(
        &self,
        multicall: Address,
        contract: Address,
        accounts: &[Address],
    ) -> crate::Result<Vec<Option<U256>>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let token = IERC20::new(contract, &self.provider);
        let mut batch =
            MulticallBuilder::<Dynamic<balanceOfCall>, &P, Ethereum>::new_dynamic(&self.provider)
                .address(multicall);
        for account in accounts {
            batch = batch.add_dynamic(token.balanceOf(*account));
        }

        log::debug!(
            "reading {} balances of token {contract} through multicall {multicall}",
            accounts.len()
        );
        let results = batch
            .try_aggregate(false)
            .await
            .map_err(|error| crate::Error::MulticallFailed {
                multicall,
                contract,
                error: Box::new(error),
            })?;

        Ok(results.into_iter().map(Result::ok).collect())
    }
}
