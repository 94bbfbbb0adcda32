//! Reconciliation metrics.
//!
//! An explicit collector handed to the loop at construction. Counters are
//! cumulative over the process lifetime.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ReconcilerMetrics {
    cycles: AtomicU64,
    cycle_failures: AtomicU64,
    reminders_enqueued: AtomicU64,
    trials_expired: AtomicU64,
    subscriptions_expired: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub cycle_failures: u64,
    pub reminders_enqueued: u64,
    pub trials_expired: u64,
    pub subscriptions_expired: u64,
}

impl ReconcilerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_failure(&self) {
        self.cycle_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reminders(&self, count: u64) {
        self.reminders_enqueued.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_trials_expired(&self, count: u64) {
        self.trials_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_subscriptions_expired(&self, count: u64) {
        self.subscriptions_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            cycle_failures: self.cycle_failures.load(Ordering::Relaxed),
            reminders_enqueued: self.reminders_enqueued.load(Ordering::Relaxed),
            trials_expired: self.trials_expired.load(Ordering::Relaxed),
            subscriptions_expired: self.subscriptions_expired.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = ReconcilerMetrics::new();
        metrics.record_cycle();
        metrics.record_cycle();
        metrics.record_cycle_failure();
        metrics.record_reminders(3);
        metrics.record_trials_expired(1);
        metrics.record_subscriptions_expired(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles, 2);
        assert_eq!(snapshot.cycle_failures, 1);
        assert_eq!(snapshot.reminders_enqueued, 3);
        assert_eq!(snapshot.trials_expired, 1);
        assert_eq!(snapshot.subscriptions_expired, 2);
    }

    #[test]
    fn snapshot_is_stable_without_writes() {
        let metrics = ReconcilerMetrics::new();
        metrics.record_reminders(5);
        assert_eq!(metrics.snapshot(), metrics.snapshot());
    }
}
