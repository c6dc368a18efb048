//! Multi-session workloads
//!
//! A workload is a fixed script per session. Sessions run concurrently,
//! so only the per-session order of steps is fixed.

use serde::{Deserialize, Serialize};

/// One scripted store call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Put(String, i32),
    Get(String),
}

impl Step {
    pub fn put(key: impl Into<String>, value: i32) -> Self {
        Step::Put(key.into(), value)
    }

    pub fn get(key: impl Into<String>) -> Self {
        Step::Get(key.into())
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Step::Get(_))
    }
}

/// Scripts for each session. Session `i` (0-based) runs as session id `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Workload {
    sessions: Vec<Vec<Step>>,
}

impl Workload {
    pub fn new(sessions: Vec<Vec<Step>>) -> Self {
        Self { sessions }
    }

    /// Three sessions over keys `a` and `b`:
    ///
    /// ```text
    /// S1: PUT(a,10) GET(a)     PUT(b,12)
    /// S2: PUT(a,20) PUT(b,21)  GET(b)
    /// S3: GET(a)    GET(b)     PUT(b,32)
    /// ```
    pub fn three_session_mix() -> Self {
        Self::new(vec![
            vec![Step::put("a", 10), Step::get("a"), Step::put("b", 12)],
            vec![Step::put("a", 20), Step::put("b", 21), Step::get("b")],
            vec![Step::get("a"), Step::get("b"), Step::put("b", 32)],
        ])
    }

    pub fn sessions(&self) -> &[Vec<Step>] {
        &self.sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Reads per run; the natural `total_reads` for k-causal
    pub fn read_count(&self) -> usize {
        self.sessions.iter().flatten().filter(|s| s.is_read()).count()
    }

    pub fn write_count(&self) -> usize {
        self.sessions.iter().flatten().filter(|s| !s.is_read()).count()
    }
}
