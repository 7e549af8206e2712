//! CLI command definitions
//!
//! Defines the clap commands for the harness.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more scenario files
    Run {
        /// Paths to YAML scenario files
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Run the scenarios concurrently
        #[arg(long)]
        parallel: bool,

        /// Print captured command output per step
        #[arg(long, short)]
        verbose: bool,

        /// Print outcomes as a JSON array on stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a scenario file without provisioning anything
    Check {
        /// Path to the YAML scenario file
        scenario: PathBuf,
    },
}
