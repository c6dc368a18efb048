//! Store metrics
//!
//! - Counters only, monotonic
//! - Reset only on store creation
//! - Relaxed atomics; counters are exact once callers quiesce

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one `KvStore`.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    writes: AtomicU64,
    removes: AtomicU64,
    /// Reads that committed a value
    reads: AtomicU64,
    /// Reads the selector could not satisfy
    reads_rejected: AtomicU64,
    /// Reads and removes of keys with no live version
    reads_missing: AtomicU64,
    conditional_conflicts: AtomicU64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_writes(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removes(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads_rejected(&self) {
        self.reads_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads_missing(&self) {
        self.reads_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conditional_conflicts(&self) {
        self.conditional_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            reads_rejected: self.reads_rejected.load(Ordering::Relaxed),
            reads_missing: self.reads_missing.load(Ordering::Relaxed),
            conditional_conflicts: self.conditional_conflicts.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub writes: u64,
    pub removes: u64,
    pub reads: u64,
    pub reads_rejected: u64,
    pub reads_missing: u64,
    pub conditional_conflicts: u64,
}

impl MetricsSnapshot {
    /// Reads attempted, whatever their outcome
    pub fn reads_attempted(&self) -> u64 {
        self.reads + self.reads_rejected
    }
}
