//! Termdock CLI - Provisioned Docker environments for MT5 trading terminals

use clap::Parser;

use termdock::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
