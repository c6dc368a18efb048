//! CLI argument definitions using clap
//!
//! Commands:
//! - mockdb serve [--config <path>] [--port <n>] [--consistency <model>]
//! - mockdb simulate [--config <path>] [--workload <path>] [--iterations <n>] ...
//! - mockdb scenario [--config <path>] [--iterations <n>] ...

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConsistencyLevel;

/// mockdb - a multi-version key-value store that simulates weak consistency
#[derive(Parser, Debug)]
#[command(name = "mockdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command; each overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read model for the store
    #[arg(long, value_enum)]
    pub consistency: Option<ConsistencyLevel>,

    /// Causal reads allowed under k-causal
    #[arg(long)]
    pub k: Option<usize>,

    /// Expected reads per run under k-causal
    #[arg(long)]
    pub total_reads: Option<usize>,

    /// Seed for reproducible selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum log severity (trace, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the store over the HTTP state API
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a multi-session workload and print the report
    Simulate {
        #[command(flatten)]
        common: CommonArgs,

        /// JSON workload file; the built-in three-session mix when absent
        #[arg(long)]
        workload: Option<PathBuf>,

        /// Number of runs, each on a fresh store
        #[arg(long, default_value_t = 100)]
        iterations: usize,
    },

    /// Run the causal-chain scenario and print the tallies
    Scenario {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of runs, each on a fresh store
        #[arg(long, default_value_t = 100)]
        iterations: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
