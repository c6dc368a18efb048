//! Command-line interface
//!
//! - serve: HTTP state API over one store
//! - simulate: concurrent workload runs
//! - scenario: causal-chain scenario runs

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, CommonArgs};
pub use commands::{load_workload, resolve_config, run, run_command, scenario, serve, simulate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
