//! Scope-based lifecycle logging
//!
//! Wraps a simulation run or the server's lifetime:
//! - `{NAME}_BEGIN` on creation
//! - `{NAME}_COMPLETE` or `{NAME}_FAILED` when closed explicitly, with the
//!   elapsed time in `duration_ms`
//! - `{NAME}_INCOMPLETE` if dropped while still open

use std::time::Instant;

use super::logger::Logger;

/// Logs begin and end events for a named unit of work
///
/// ```ignore
/// let scope = ObservationScope::with_fields("SIMULATION", &[("consistency", "causal")]);
/// let report = run(...);
/// scope.complete_with_fields(&[("reads", &report.reads.to_string())]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: bool,
    fields: Vec<(&'a str, String)>,
    timer: Timer,
}

impl<'a> ObservationScope<'a> {
    /// Logs `{name}_BEGIN` immediately.
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Like `new`; `fields` are repeated on the closing line.
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);

        Self {
            name,
            completed: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            timer: Timer::new(),
        }
    }

    /// Logs `{name}_COMPLETE` at INFO.
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();

        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.extend(extra_fields.iter().copied());
        all_fields.push(("duration_ms", &elapsed));

        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Logs `{name}_FAILED` at ERROR.
    pub fn fail(mut self, reason: &str) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();
        Logger::error(
            &format!("{}_FAILED", self.name),
            &[("duration_ms", &elapsed), ("reason", reason)],
        );
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Wall-clock timer for duration fields
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_starts_open() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_completed());
        scope.complete();
    }

    #[test]
    fn test_scope_with_fields() {
        let scope = ObservationScope::with_fields("TEST", &[("consistency", "causal")]);
        scope.complete_with_fields(&[("reads", "12"), ("rejected", "0")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST");
        scope.fail("address already in use");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let ms: u64 = timer.elapsed_ms().parse().unwrap();
        assert!(ms >= 10);
    }
}
