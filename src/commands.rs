//! CLI command definitions
//!
//! Defines the clap commands for the tour CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// List registered tours
    List,

    /// Show the steps of a tour
    Show {
        /// Tour name
        name: String,
    },

    /// Check a tour definition file without running it
    Validate {
        /// Path to the YAML tour definition
        path: PathBuf,
    },

    /// Run a tour against a scripted UI surface
    Run {
        /// Tour name
        name: String,

        /// YAML fixture describing the UI surface
        #[arg(long)]
        surface: PathBuf,

        /// How long each step waits for its trigger (default from config)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        /// Show every step state change as it happens
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show or initialise the configuration file
    Config {
        /// Write the default configuration if no file exists
        #[arg(long)]
        init: bool,
    },
}
