//! Causal-chain scenario
//!
//! ```text
//! C1: W(x)a
//! C2:        R(x)a  W(x)b
//! C3:                      R(x)?  R(x)?
//! C4:                      R(x)?  R(x)?
//! ```
//!
//! A reader that has seen `b` must never go back to `a`. Seeing `a` then
//! `b`, or `a` twice, is causally fine but not linearizable.

use serde::Serialize;

use super::runner::config_for_iteration;
use crate::config::{ConfigResult, SimConfig};
use crate::observability::ObservationScope;
use crate::store::{KvStore, StoreResult};

pub const SCENARIO_KEY: &str = "x";
/// Value written by C1
pub const VALUE_A: i32 = 5;
/// Value written by C2
pub const VALUE_B: i32 = 10;
/// Reads issued by one scenario run
pub const SCENARIO_READS: usize = 5;

/// Values observed by one scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScenarioOutcome {
    /// C2's read, before it writes `b`
    pub c2: i32,
    pub c3: [i32; 2],
    pub c4: [i32; 2],
}

impl ScenarioOutcome {
    /// Every read returned the newest value.
    pub fn is_linearizable(&self) -> bool {
        self.c2 == VALUE_A && self.c3 == [VALUE_B; 2] && self.c4 == [VALUE_B; 2]
    }

    /// Some reader saw `b` and then `a`.
    pub fn has_regression(&self) -> bool {
        self.c3 == [VALUE_B, VALUE_A] || self.c4 == [VALUE_B, VALUE_A]
    }
}

/// Runs the scenario once against an empty `store`, sessions 1 to 4.
pub fn causal_chain_scenario(store: &KvStore<String, i32>) -> StoreResult<ScenarioOutcome> {
    let (c1, c2, c3, c4) = (1, 2, 3, 4);

    store.put(SCENARIO_KEY, VALUE_A, c1);
    let c2_read = store.get(SCENARIO_KEY, c2)?;
    store.put(SCENARIO_KEY, VALUE_B, c2);
    let c3_first = store.get(SCENARIO_KEY, c3)?;
    let c4_first = store.get(SCENARIO_KEY, c4)?;
    let c3_second = store.get(SCENARIO_KEY, c3)?;
    let c4_second = store.get(SCENARIO_KEY, c4)?;

    Ok(ScenarioOutcome {
        c2: c2_read,
        c3: [c3_first, c3_second],
        c4: [c4_first, c4_second],
    })
}

/// Tallies over repeated scenario runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub consistency: String,
    pub iterations: usize,
    /// Runs in which every read saw the newest value
    pub linearizable: usize,
    /// Runs in which a reader went from `b` back to `a`
    pub regressions: usize,
    /// Runs aborted by a failed read
    pub failed: usize,
}

/// Runs the scenario `iterations` times, each on a fresh store.
pub fn run_scenario(config: &SimConfig, iterations: usize) -> ConfigResult<ScenarioReport> {
    let iterations_str = iterations.to_string();
    let scope = ObservationScope::with_fields(
        "SCENARIO",
        &[
            ("consistency", config.consistency.as_str()),
            ("iterations", &iterations_str),
        ],
    );

    let mut report = ScenarioReport {
        consistency: config.consistency.as_str().to_string(),
        iterations,
        ..ScenarioReport::default()
    };

    for iteration in 0..iterations {
        let store = match config_for_iteration(config, iteration).build_store(Some(SCENARIO_READS)) {
            Ok(store) => store,
            Err(e) => {
                scope.fail(e.message());
                return Err(e);
            }
        };

        match causal_chain_scenario(&store) {
            Ok(outcome) => {
                if outcome.is_linearizable() {
                    report.linearizable += 1;
                }
                if outcome.has_regression() {
                    report.regressions += 1;
                }
            }
            Err(_) => report.failed += 1,
        }
    }

    scope.complete_with_fields(&[
        ("linearizable", &report.linearizable.to_string()),
        ("regressions", &report.regressions.to_string()),
    ]);
    Ok(report)
}
