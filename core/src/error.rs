use alloy::{primitives::Address, providers::MulticallError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Utils(#[from] balsnap_utils::Error),

    #[error("Failed to fetch {field} of token {contract}. (Error: {error:?})")]
    TokenInfoFetchFailed {
        contract: Address,
        field: &'static str,
        error: Box<alloy::contract::Error>,
    },

    #[error("Multicall at {multicall} failed for token {contract}. (Error: {error:?})")]
    MulticallFailed {
        multicall: Address,
        contract: Address,
        error: Box<MulticallError>,
    },

    #[error("Multicall for token {contract} returned {returned} results for {expected} calls.")]
    MulticallResultCount {
        contract: Address,
        expected: usize,
        returned: usize,
    },

    #[error("No contract info cached for token {0}.")]
    MissingContractInfo(Address),

    #[error(transparent)]
    UnitsConversion(#[from] alloy::primitives::utils::UnitsError),

    #[error("Failed to parse balance as a number. (Error: {0})")]
    BalanceParse(#[from] std::num::ParseFloatError),
}
