use clap::Parser;
use console::style;

mod cli;
mod handlers;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = cli::Cli::parse();

    if let Err(e) = cli.cmd.handle().await {
        eprintln!("{} {e}", style("error:").red());
        std::process::exit(1);
    }
}
