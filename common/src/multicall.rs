use alloy::primitives::{address, Address};

/// Multicall2 on Ethereum mainnet, see https://github.com/makerdao/multicall
pub const MAINNET_MULTICALL2_ADDRESS: Address =
    address!("5ba1e12693dc8f9c48aad8770482f4739beed696");

/// Multicall3, deployed at the same address on most EVM chains.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");
