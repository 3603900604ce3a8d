use std::{collections::HashMap, fmt::Display};

use alloy::{
    primitives::{address, Address},
    providers::{Provider, ProviderBuilder},
};
use balsnap_common::multicall::{MAINNET_MULTICALL2_ADDRESS, MULTICALL3_ADDRESS};
use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferMany, serde_as, skip_serializing_none, OneOrMany};

use crate::{
    config::Config,
    disk_storage::{DiskStorageInterface, FileFormat},
};

#[skip_serializing_none]
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    pub name_aliases: Vec<String>,
    pub chain_id: u32,
    pub rpc_url: Option<String>,
    pub rpc_alchemy: Option<String>,
    pub rpc_infura: Option<String>,
    pub multicall_address: Option<Address>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_testnet: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Token {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub contract_address: Address,
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (chain_id: {})", self.name, self.chain_id)
    }
}

impl Network {
    pub fn from_name(network_name: &str) -> crate::Result<Network> {
        NetworkStore::load_and_update()?
            .get_by_name(network_name)
            .ok_or(crate::Error::NetworkNotFound(network_name.to_string()))
    }

    pub fn matches_name(&self, network_name: &str) -> bool {
        self.name.eq_ignore_ascii_case(network_name)
            || self
                .name_aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(network_name))
    }

    pub fn get_rpc(&self) -> crate::Result<String> {
        if let Some(rpc_url) = &self.rpc_url {
            return Ok(rpc_url.clone());
        }

        let mut missing_key = None;

        if let Some(rpc_alchemy) = &self.rpc_alchemy {
            match Config::alchemy_api_key() {
                Ok(key) => return Ok(rpc_alchemy.replace("{}", &key)),
                Err(e) => missing_key = Some(e),
            }
        }

        if let Some(rpc_infura) = &self.rpc_infura {
            match Config::infura_project_id() {
                Ok(id) => return Ok(rpc_infura.replace("{}", &id)),
                Err(e) => missing_key = missing_key.or(Some(e)),
            }
        }

        Err(missing_key.unwrap_or_else(|| crate::Error::RpcUrlNotFound {
            network: self.name.clone(),
            chain_id: self.chain_id,
        }))
    }

    pub fn get_provider(&self) -> crate::Result<impl Provider> {
        let rpc_url = self.get_rpc()?;

        rpc_url
            .parse()
            .map_err(|e| crate::Error::UrlParsingFailed(rpc_url, e))
            .map(|rpc_url| ProviderBuilder::new().connect_http(rpc_url))
    }

    /// Known token on this network by symbol, case insensitive.
    pub fn find_token(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NetworkStore {
    pub networks: Vec<Network>,
}

impl DiskStorageInterface for NetworkStore {
    const FILE_NAME: &'static str = "networks";
    const FORMAT: FileFormat = FileFormat::YAML;
}

impl NetworkStore {
    pub fn defaults() -> Self {
        NetworkStore {
            networks: default_networks(),
        }
    }

    /// Loads the networks from disk, with the built-in networks filled in
    /// underneath, and writes the merged list back.
    pub fn load_and_update() -> crate::Result<Self> {
        let store_updated = Self::merge(default_networks(), NetworkStore::load()?.networks);
        store_updated.save()?;
        Ok(store_updated)
    }

    /// Entries of `overrides` win over `base` per chain id, optional fields
    /// fall back to the `base` entry and tokens are unioned.
    pub fn merge(base: Vec<Network>, overrides: Vec<Network>) -> Self {
        let mut networks = HashMap::<u32, Network>::new();

        let merge_tokens = |a: Vec<Token>, b: Vec<Token>| {
            let mut map = HashMap::<Address, Token>::new();
            for token in a.into_iter().chain(b) {
                map.entry(token.contract_address).or_insert(token);
            }
            let mut tokens = map.into_values().collect::<Vec<Token>>();
            tokens.sort_by(|a, b| a.contract_address.cmp(&b.contract_address));
            tokens
        };

        let mut insert = |new_entry: Network| {
            let entry = if let Some(existing) = networks.remove(&new_entry.chain_id) {
                let mut name_aliases = vec![];
                for n in new_entry
                    .name_aliases
                    .iter()
                    .chain(existing.name_aliases.iter())
                {
                    if !name_aliases.contains(n) {
                        name_aliases.push(n.clone());
                    }
                }
                Network {
                    name: new_entry.name,
                    name_aliases,
                    chain_id: new_entry.chain_id,
                    rpc_url: new_entry.rpc_url.or(existing.rpc_url),
                    rpc_alchemy: new_entry.rpc_alchemy.or(existing.rpc_alchemy),
                    rpc_infura: new_entry.rpc_infura.or(existing.rpc_infura),
                    multicall_address: new_entry.multicall_address.or(existing.multicall_address),
                    is_testnet: new_entry.is_testnet,
                    tokens: merge_tokens(new_entry.tokens, existing.tokens),
                }
            } else {
                new_entry
            };

            networks.insert(entry.chain_id, entry);
        };

        for network in base {
            insert(network);
        }
        for network in overrides {
            insert(network);
        }

        // Sort by chain ID and keep testnets at the bottom
        let mut networks: Vec<Network> = networks.into_values().collect();
        networks.sort_by(|a, b| {
            a.is_testnet
                .cmp(&b.is_testnet)
                .then(a.chain_id.cmp(&b.chain_id))
        });

        NetworkStore { networks }
    }

    pub fn get_by_name(&self, network_name: &str) -> Option<Network> {
        self.networks
            .iter()
            .find(|n| n.matches_name(network_name))
            .cloned()
    }

    pub fn get_by_chain_id(&self, chain_id: u32) -> Option<Network> {
        self.networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .cloned()
    }
}

fn token(name: &str, symbol: &str, decimals: u8, contract_address: Address) -> Token {
    Token {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        contract_address,
    }
}

fn default_networks() -> Vec<Network> {
    vec![
        Network {
            name: "Mainnet".to_string(),
            name_aliases: vec!["ethereum".to_string(), "eth-mainnet".to_string()],
            chain_id: 1,
            rpc_url: None,
            rpc_alchemy: Some("https://eth-mainnet.g.alchemy.com/v2/{}".to_string()),
            rpc_infura: Some("https://mainnet.infura.io/v3/{}".to_string()),
            multicall_address: Some(MAINNET_MULTICALL2_ADDRESS),
            is_testnet: false,
            tokens: vec![
                token(
                    "Wrapped Ether",
                    "WETH",
                    18,
                    address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
                ),
                token(
                    "Dai Stablecoin",
                    "DAI",
                    18,
                    address!("6b175474e89094c44da98b954eedeac495271d0f"),
                ),
                token(
                    "USD Coin",
                    "USDC",
                    6,
                    address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                ),
                token(
                    "Tether USD",
                    "USDT",
                    6,
                    address!("dAC17F958D2ee523a2206206994597C13D831ec7"),
                ),
            ],
        },
        Network {
            name: "Arbitrum".to_string(),
            name_aliases: vec!["arb-mainnet".to_string()],
            chain_id: 42161,
            rpc_url: None,
            rpc_alchemy: Some("https://arb-mainnet.g.alchemy.com/v2/{}".to_string()),
            rpc_infura: Some("https://arbitrum-mainnet.infura.io/v3/{}".to_string()),
            multicall_address: Some(MULTICALL3_ADDRESS),
            is_testnet: false,
            tokens: vec![
                token(
                    "Wrapped Ether",
                    "WETH",
                    18,
                    address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
                ),
                token(
                    "Dai Stablecoin",
                    "DAI",
                    18,
                    address!("DA10009cBd5D07dd0CeCc66161FC93D7c9000da1"),
                ),
                token(
                    "USD Coin",
                    "USDC",
                    6,
                    address!("af88d065e77c8cC2239327C5EDb3A432268e5831"),
                ),
            ],
        },
        Network {
            name: "Optimism".to_string(),
            name_aliases: vec!["opt-mainnet".to_string()],
            chain_id: 10,
            rpc_url: None,
            rpc_alchemy: Some("https://opt-mainnet.g.alchemy.com/v2/{}".to_string()),
            rpc_infura: Some("https://optimism-mainnet.infura.io/v3/{}".to_string()),
            multicall_address: Some(MULTICALL3_ADDRESS),
            is_testnet: false,
            tokens: vec![],
        },
        Network {
            name: "Base".to_string(),
            name_aliases: vec!["base-mainnet".to_string()],
            chain_id: 8453,
            rpc_url: None,
            rpc_alchemy: Some("https://base-mainnet.g.alchemy.com/v2/{}".to_string()),
            rpc_infura: None,
            multicall_address: Some(MULTICALL3_ADDRESS),
            is_testnet: false,
            tokens: vec![token(
                "USD Coin",
                "USDC",
                6,
                address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            )],
        },
        Network {
            name: "Polygon".to_string(),
            name_aliases: vec!["polygon-mainnet".to_string(), "matic-mainnet".to_string()],
            chain_id: 137,
            rpc_url: None,
            rpc_alchemy: Some("https://polygon-mainnet.g.alchemy.com/v2/{}".to_string()),
            rpc_infura: Some("https://polygon-mainnet.infura.io/v3/{}".to_string()),
            multicall_address: Some(MULTICALL3_ADDRESS),
            is_testnet: false,
            tokens: vec![],
        },
        Network {
            name: "Sepolia".to_string(),
            name_aliases: vec!["eth-sepolia".to_string()],
            chain_id: 11155111,
            rpc_url: None,
            rpc_alchemy: Some("https://eth-sepolia.g.alchemy.com/v2/{}".to_string()),
            rpc_infura: Some("https://sepolia.infura.io/v3/{}".to_string()),
            multicall_address: Some(MULTICALL3_ADDRESS),
            is_testnet: true,
            tokens: vec![],
        },
    ]
}
