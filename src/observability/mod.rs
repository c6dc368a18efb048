//! Observability
//!
//! - Structured JSON logging with a process-wide severity threshold
//! - Per-store operation counters
//! - Typed lifecycle events and begin/complete scopes
//!
//! Observability is read-only: nothing here feeds back into store behavior.
//!
//! ```ignore
//! use mockdb::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::ConfigLoaded, &[("consistency", "causal")]);
//!
//! let scope = ObservationScope::new("SIMULATION");
//! // ... run ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use scope::{ObservationScope, Timer};

/// Log an event at its own severity
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        event.severity()
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::StoreCreated);
        log_event(Event::ShutdownComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("consistency", "linearizable")]);
        // Below the default threshold, dropped silently
        log_event_with_fields(Event::ReadCommit, &[("key", "x")]);
    }
}
