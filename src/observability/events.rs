//! Observable events
//!
//! Events are explicit and typed. Per-operation store events log at TRACE,
//! rejections at WARN, lifecycle events at INFO. Run-level begin and
//! complete lines come from `ObservationScope`.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    ConfigLoaded,
    StoreCreated,
    Serving,
    ShutdownComplete,

    // Store operations
    WriteCommit,
    ReadCommit,
    RemoveCommit,
    ReadKeyNotFound,
    ReadInconsistent,
    ConditionalWriteRejected,

    // Selectors
    WeakSetDrawn,

    // Simulation
    /// A workload session thread panicked
    SessionAborted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreCreated => "STORE_CREATED",
            Event::Serving => "MOCKDB_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::WriteCommit => "WRITE_COMMIT",
            Event::ReadCommit => "READ_COMMIT",
            Event::RemoveCommit => "REMOVE_COMMIT",
            Event::ReadKeyNotFound => "READ_KEY_NOT_FOUND",
            Event::ReadInconsistent => "READ_INCONSISTENT",
            Event::ConditionalWriteRejected => "CONDITIONAL_WRITE_REJECTED",

            Event::WeakSetDrawn => "WEAK_SET_DRAWN",

            Event::SessionAborted => "SESSION_ABORTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreCreated
            | Event::WriteCommit
            | Event::ReadCommit
            | Event::RemoveCommit
            | Event::ReadKeyNotFound
            | Event::WeakSetDrawn => Severity::Trace,
            Event::ReadInconsistent | Event::ConditionalWriteRejected => Severity::Warn,
            Event::SessionAborted => Severity::Error,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        false
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
