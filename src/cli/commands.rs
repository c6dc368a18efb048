//! CLI command implementations
//!
//! Each command resolves its configuration the same way: file values (or
//! defaults), then command-line overrides, then validation.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::SimConfig;
use crate::http_server::HttpServer;
use crate::observability::Logger;
use crate::simulation::{run_scenario, run_workload, Workload};
use crate::store::KvStore;

use super::args::{Command, CommonArgs};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Parse the command line and run the command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { common, port } => serve(&common, port),
        Command::Simulate {
            common,
            workload,
            iterations,
        } => simulate(&common, workload.as_deref(), iterations),
        Command::Scenario { common, iterations } => scenario(&common, iterations),
    }
}

/// Loads the config file if given, applies flag overrides and validates.
///
/// Also installs the configured log threshold.
pub fn resolve_config(common: &CommonArgs) -> CliResult<SimConfig> {
    let mut config = match &common.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if let Some(consistency) = common.consistency {
        config.consistency = consistency;
    }
    if let Some(k) = common.k {
        config.k = k;
    }
    if let Some(total_reads) = common.total_reads {
        config.total_reads = total_reads;
    }
    if let Some(seed) = common.seed {
        config.seed = Some(seed);
    }
    if let Some(level) = &common.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

/// Start the HTTP binding and block until Ctrl-C
pub fn serve(common: &CommonArgs, port: Option<u16>) -> CliResult<()> {
    let mut config = resolve_config(common)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    // No workload to derive a read count from here
    let store: KvStore<String, Value> = config.build_store(None)?;
    let server = HttpServer::with_store(config.http.clone(), store);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Run a workload and print the report
pub fn simulate(common: &CommonArgs, workload_path: Option<&Path>, iterations: usize) -> CliResult<()> {
    let config = resolve_config(common)?;
    let workload = match workload_path {
        Some(path) => load_workload(path)?,
        None => Workload::three_session_mix(),
    };

    let report = run_workload(&config, &workload, iterations)?;
    write_response(&report)
}

/// Run the causal-chain scenario and print the tallies
pub fn scenario(common: &CommonArgs, iterations: usize) -> CliResult<()> {
    let config = resolve_config(common)?;
    let report = run_scenario(&config, iterations)?;
    write_response(&report)
}

pub fn load_workload(path: &Path) -> CliResult<Workload> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::workload_error(format!("Failed to read workload {}: {}", path.display(), e))
    })?;

    let workload: Workload = serde_json::from_str(&content)
        .map_err(|e| CliError::workload_error(format!("Invalid workload JSON: {}", e)))?;

    if workload.session_count() == 0 {
        return Err(CliError::workload_error("Workload has no sessions"));
    }
    Ok(workload)
}
