use alloy::{primitives::Address, providers::Provider};
use balsnap::{
    create_snapshot_accounts, AddressFilter, BalSnap, ProviderTokenReader, TableOptions,
};
use balsnap_utils::{
    alloy::StringExt,
    config::{parse_digits, Config},
    disk_storage::DiskStorageInterface,
    network::{Network, NetworkStore},
};
use console::style;

use crate::cli::{Commands, SnapshotArgs};

const DEFAULT_NETWORK: &str = "Mainnet";

impl Commands {
    pub async fn handle(self) -> balsnap::Result<()> {
        match self {
            Commands::Snapshot(args) => args.handle().await,
            Commands::Networks => {
                let current = Config::current_network()?;
                for network in NetworkStore::load_and_update()?.networks {
                    let marker = if current
                        .as_deref()
                        .is_some_and(|name| network.matches_name(name))
                    {
                        style("*").green().to_string()
                    } else {
                        " ".to_string()
                    };
                    let multicall = network
                        .multicall_address
                        .map(|address| address.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let tokens: Vec<&str> =
                        network.tokens.iter().map(|t| t.symbol.as_str()).collect();
                    println!(
                        "{marker} {network} multicall: {multicall} tokens: [{}]",
                        tokens.join(", ")
                    );
                }
                Ok(())
            }
            Commands::UseNetwork { name } => {
                let network = Network::from_name(&name)?;
                Config::set_current_network(network.name.clone())?;
                println!("Using {network}");
                Ok(())
            }
        }
    }
}

impl SnapshotArgs {
    async fn handle(self) -> balsnap::Result<()> {
        let config = Config::load()?;
        let network_name = self
            .network
            .clone()
            .or_else(|| config.current_network.clone())
            .unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let network = Network::from_name(&network_name)?;
        log::info!("using network {network}");

        if let Some(rpc_url) = &self.rpc_url {
            let provider = rpc_url.to_alloy_provider()?;
            self.run(provider, &network, &config).await
        } else {
            let provider = network.get_provider()?;
            self.run(provider, &network, &config).await
        }
    }

    async fn run<P: Provider>(
        &self,
        provider: P,
        network: &Network,
        config: &Config,
    ) -> balsnap::Result<()> {
        let multicall = match &self.multicall {
            Some(address) => Some(address.parse_as_address()?),
            None => network.multicall_address,
        };
        let mut balsnap = BalSnap::new(ProviderTokenReader::new(provider), multicall);

        let contracts = self
            .contracts
            .iter()
            .map(|contract| resolve_contract(network, contract))
            .collect::<balsnap::Result<Vec<_>>>()?;
        let pairs = create_snapshot_accounts(&self.accounts, contracts)?;
        let added = balsnap.add_snapshot_accounts(pairs).await?;
        log::info!("tracking {added} account-token pairs");

        let options = self.table_options(network, config)?;
        for round in 0..self.rounds {
            if round > 0 {
                tokio::time::sleep(self.interval).await;
            }
            balsnap.snapshot().await?;
            balsnap.print_table(&options);
        }

        Ok(())
    }

    fn table_options(&self, network: &Network, config: &Config) -> balsnap::Result<TableOptions> {
        let digits = self.digits.map_or_else(|| config.digits(), parse_digits);
        let mut options = TableOptions::default().with_digits(digits);

        if !self.only_accounts.is_empty() {
            options = options.only_accounts(parse_addresses(&self.only_accounts)?);
        }
        if !self.only_contracts.is_empty() {
            let contracts = self
                .only_contracts
                .iter()
                .map(|contract| resolve_contract(network, contract))
                .collect::<balsnap::Result<Vec<_>>>()?;
            options = options.only_contracts(contracts);
        }

        Ok(options)
    }
}

/// An address, or the symbol of a token the network knows about.
fn resolve_contract(network: &Network, contract: &str) -> balsnap::Result<Address> {
    match contract.parse_as_address() {
        Ok(address) => Ok(address),
        Err(e) => network
            .find_token(contract)
            .map(|token| token.contract_address)
            .ok_or_else(|| e.into()),
    }
}

fn parse_addresses(addresses: &[String]) -> balsnap::Result<AddressFilter> {
    Ok(AddressFilter::Many(
        addresses
            .iter()
            .map(|address| address.parse_as_address())
            .collect::<balsnap_utils::Result<Vec<_>>>()?,
    ))
}
