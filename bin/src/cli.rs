use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "balsnap", bin_name = "balsnap", version)]
#[command(about = "Snapshot ERC20 balances of many accounts at once through multicall")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Snapshot token balances and print the latest ones as a table
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// List the configured networks
    Networks,

    /// Set the network used when --network is not given
    #[command(alias = "use")]
    UseNetwork { name: String },
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Account address, repeat for more accounts
    #[arg(short, long = "account", required = true)]
    pub accounts: Vec<String>,

    /// Token contract address or the symbol of a token known on the network,
    /// repeat for more tokens
    #[arg(short, long = "contract", required = true)]
    pub contracts: Vec<String>,

    /// Network name or alias, defaults to the configured network or Mainnet
    #[arg(short, long, env = "BALSNAP_NETWORK")]
    pub network: Option<String>,

    /// RPC endpoint to use instead of the one of the network
    #[arg(long, env = "BALSNAP_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Multicall contract address, defaults to the one of the network
    #[arg(long)]
    pub multicall: Option<String>,

    /// Characters kept on each side of abbreviated addresses, -1 for full addresses
    #[arg(long, allow_negative_numbers = true)]
    pub digits: Option<i32>,

    /// Only show these accounts in the table
    #[arg(long = "only-account")]
    pub only_accounts: Vec<String>,

    /// Only show these tokens in the table
    #[arg(long = "only-contract")]
    pub only_contracts: Vec<String>,

    /// Number of snapshots to take
    #[arg(long, default_value_t = 1)]
    pub rounds: u32,

    /// Pause between snapshots, e.g. "30s" or "5m"
    #[arg(long, default_value = "1m", value_parser = humantime::parse_duration)]
    pub interval: Duration,
}
