//! Simulation harness
//!
//! Drives stores built from a `SimConfig` with scripted sessions and
//! reports what the sessions observed.
//!
//! - `run_workload`: concurrent multi-session workloads, one thread per session
//! - `run_scenario`: the sequential causal-chain scenario

mod runner;
mod scenario;
mod workload;

pub use runner::{run_workload, stale_reads, SimulationReport};
pub use scenario::{
    causal_chain_scenario, run_scenario, ScenarioOutcome, ScenarioReport, SCENARIO_KEY,
    SCENARIO_READS, VALUE_A, VALUE_B,
};
pub use workload::{Step, Workload};
