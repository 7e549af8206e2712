//! provcheck - a compute-provisioning verification harness
//!
//! Exit status 0 means every scenario passed; non-zero means at least one
//! scenario failed or the harness itself could not run.

use clap::Parser;
use provcheck::commands::Commands;
use provcheck::{cli, common};

#[derive(Parser)]
#[command(name = "provcheck", about = "Compute-provisioning verification harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
