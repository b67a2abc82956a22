//! Fan-out counters
//!
//! - Counters only, monotonic, reset on process start
//! - Lock-free; Relaxed ordering is enough since no decision reads them

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters for the schema resolution path
#[derive(Debug, Default)]
pub struct FanoutMetrics {
    /// Top-level resolutions started
    resolutions_started: AtomicU64,
    /// Resolutions that returned a node list
    resolutions_succeeded: AtomicU64,
    /// Resolutions that returned an error other than cancellation
    resolutions_failed: AtomicU64,
    /// Resolutions abandoned because the caller cancelled or timed out
    resolutions_cancelled: AtomicU64,
    /// Sub-requests answered in-process
    local_dispatches: AtomicU64,
    /// Sub-requests forwarded to a group leader
    remote_dispatches: AtomicU64,
    /// Forwarded sub-requests this node answered
    remote_requests_served: AtomicU64,
    /// Forwarded sub-requests this node refused
    remote_requests_rejected: AtomicU64,
}

impl FanoutMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_resolutions_started(&self) {
        self.resolutions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolutions_succeeded(&self) {
        self.resolutions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolutions_failed(&self) {
        self.resolutions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolutions_cancelled(&self) {
        self.resolutions_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_local_dispatches(&self) {
        self.local_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_remote_dispatches(&self) {
        self.remote_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_remote_requests_served(&self) {
        self.remote_requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_remote_requests_rejected(&self) {
        self.remote_requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resolutions_started: self.resolutions_started.load(Ordering::Relaxed),
            resolutions_succeeded: self.resolutions_succeeded.load(Ordering::Relaxed),
            resolutions_failed: self.resolutions_failed.load(Ordering::Relaxed),
            resolutions_cancelled: self.resolutions_cancelled.load(Ordering::Relaxed),
            local_dispatches: self.local_dispatches.load(Ordering::Relaxed),
            remote_dispatches: self.remote_dispatches.load(Ordering::Relaxed),
            remote_requests_served: self.remote_requests_served.load(Ordering::Relaxed),
            remote_requests_rejected: self.remote_requests_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub resolutions_started: u64,
    pub resolutions_succeeded: u64,
    pub resolutions_failed: u64,
    pub resolutions_cancelled: u64,
    pub local_dispatches: u64,
    pub remote_dispatches: u64,
    pub remote_requests_served: u64,
    pub remote_requests_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let metrics = FanoutMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let metrics = FanoutMetrics::new();

        metrics.increment_resolutions_started();
        metrics.increment_resolutions_started();
        metrics.increment_resolutions_succeeded();
        metrics.increment_resolutions_cancelled();
        metrics.increment_local_dispatches();
        metrics.increment_remote_dispatches();
        metrics.increment_remote_dispatches();
        metrics.increment_remote_requests_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.resolutions_started, 2);
        assert_eq!(snapshot.resolutions_succeeded, 1);
        assert_eq!(snapshot.resolutions_failed, 0);
        assert_eq!(snapshot.resolutions_cancelled, 1);
        assert_eq!(snapshot.local_dispatches, 1);
        assert_eq!(snapshot.remote_dispatches, 2);
        assert_eq!(snapshot.remote_requests_served, 0);
        assert_eq!(snapshot.remote_requests_rejected, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = FanoutMetrics::new();
        metrics.increment_remote_requests_served();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["remote_requests_served"], 1);
        assert_eq!(json["resolutions_started"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(FanoutMetrics::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let m = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.increment_local_dispatches();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().local_dispatches, 800);
    }
}
