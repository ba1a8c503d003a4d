//! Error injection controller for testing.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Controller for injecting failures into an [crate::InMemoryStore].
///
/// Every counter fails the next N matching operations and then goes back to normal.
#[derive(Debug, Default)]
pub struct ErrorInjector {
    /// Reject every item of the next N bulks.
    fail_next_bulks: AtomicUsize,
    /// Fail the next N bulks before they reach the store.
    fail_next_transports: AtomicUsize,
    /// Fail the next N connects.
    fail_next_connects: AtomicUsize,
    /// Fail the next N closes. The connection is released anyway.
    fail_next_closes: AtomicUsize,
    /// Artificial bulk latency in milliseconds.
    bulk_latency_ms: AtomicU64,
}

impl ErrorInjector {
    /// Create a new error injector with all errors disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every item of the next N bulks with a 429.
    pub fn fail_bulks(&self, count: usize) {
        self.fail_next_bulks.store(count, Ordering::Relaxed);
    }

    /// Fail the next N bulks with a transport error.
    pub fn fail_transports(&self, count: usize) {
        self.fail_next_transports.store(count, Ordering::Relaxed);
    }

    pub fn fail_connects(&self, count: usize) {
        self.fail_next_connects.store(count, Ordering::Relaxed);
    }

    pub fn fail_closes(&self, count: usize) {
        self.fail_next_closes.store(count, Ordering::Relaxed);
    }

    pub fn set_bulk_latency(&self, ms: u64) {
        self.bulk_latency_ms.store(ms, Ordering::Relaxed);
    }

    pub(crate) fn should_fail_bulk(&self) -> bool {
        Self::decrement_counter(&self.fail_next_bulks)
    }

    pub(crate) fn should_fail_transport(&self) -> bool {
        Self::decrement_counter(&self.fail_next_transports)
    }

    pub(crate) fn should_fail_connect(&self) -> bool {
        Self::decrement_counter(&self.fail_next_connects)
    }

    pub(crate) fn should_fail_close(&self) -> bool {
        Self::decrement_counter(&self.fail_next_closes)
    }

    /// Helper to decrement a counter and return true if it was > 0.
    fn decrement_counter(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_sub(1))
            .is_ok()
    }

    pub(crate) async fn apply_bulk_latency(&self) {
        let ms = self.bulk_latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_countdowns() {
        let injector = ErrorInjector::new();
        assert!(!injector.should_fail_bulk());
        assert!(!injector.should_fail_transport());

        injector.fail_bulks(2);
        assert!(injector.should_fail_bulk());
        assert!(injector.should_fail_bulk());
        assert!(!injector.should_fail_bulk());

        injector.fail_connects(1);
        assert!(injector.should_fail_connect());
        assert!(!injector.should_fail_connect());

        // Reset by setting to 0
        injector.fail_closes(5);
        assert!(injector.should_fail_close());
        injector.fail_closes(0);
        assert!(!injector.should_fail_close());
    }

    #[test]
    fn test_independent_failure_counters() {
        let injector = ErrorInjector::new();

        injector.fail_transports(1);
        injector.fail_bulks(1);

        assert!(injector.should_fail_transport());
        assert!(!injector.should_fail_transport());
        assert!(injector.should_fail_bulk());
        assert!(!injector.should_fail_bulk());
    }

    #[tokio::test]
    async fn test_bulk_latency() {
        let injector = ErrorInjector::new();
        injector.set_bulk_latency(20);

        let start = tokio::time::Instant::now();
        injector.apply_bulk_latency().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
