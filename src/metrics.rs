use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tasks_started: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_aborted: u64,
    pub in_flight: u64,
}

/// Counters over the retrieval task lifecycle. Every task increments
/// `started` exactly once and then exactly one of `completed` / `failed` /
/// `aborted`. The in-flight gauge is derived from the counters in
/// `snapshot`, so an aborted task cannot leave it drifting.
pub struct FetchMetrics {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    aborted: AtomicU64,
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self {
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    pub fn task_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Only called for aborts that actually landed (the task was cancelled
    /// before it could resolve).
    pub fn task_aborted(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let started = self.started.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let aborted = self.aborted.load(Ordering::Relaxed);
        MetricsSnapshot {
            tasks_started: started,
            tasks_completed: completed,
            tasks_failed: failed,
            tasks_aborted: aborted,
            // A task aborted before acquiring its permit never counted as
            // started; saturate rather than wrap in that window.
            in_flight: started.saturating_sub(completed + failed + aborted),
        }
    }
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self::new()
    }
}
