//! Tour Runner CLI
//!
//! Lists, inspects, validates and runs declarative UI walkthrough tours.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use tour::common::logging;
use tour::{cli, commands};

#[derive(Parser)]
#[command(name = "tour", about = "Declarative UI walkthrough runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Additional directory of YAML tour definitions (repeatable)
    #[arg(long = "tours", global = true)]
    tour_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);

    if let Err(e) = cli::dispatch(cli.command, &cli.tour_dirs).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
