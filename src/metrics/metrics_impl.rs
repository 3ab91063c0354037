use crate::metrics::snapshot::MemoMetricsSnapshot;
use crate::metrics::traits::{BoundedMetricsRecorder, CoreMetricsRecorder, ReclaimMetricsRecorder};

#[derive(Debug, Default, Clone)]
pub struct MemoMetrics {
    pub get_calls: u64,
    pub hits: u64,
    pub misses: u64,
    pub compute_failures: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub uncached_misses: u64,
    pub sweeps: u64,
    pub swept_entries: u64,
    pub stale_replaced: u64,
}

impl MemoMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the counters into a snapshot with the given gauges.
    pub fn to_snapshot(&self, cache_len: usize, capacity: Option<usize>) -> MemoMetricsSnapshot {
        MemoMetricsSnapshot {
            get_calls: self.get_calls,
            hits: self.hits,
            misses: self.misses,
            compute_failures: self.compute_failures,
            inserts: self.inserts,
            evictions: self.evictions,
            uncached_misses: self.uncached_misses,
            sweeps: self.sweeps,
            swept_entries: self.swept_entries,
            stale_replaced: self.stale_replaced,
            cache_len,
            capacity,
        }
    }
}

impl CoreMetricsRecorder for MemoMetrics {
    fn record_hit(&mut self) {
        self.get_calls += 1;
        self.hits += 1;
    }

    fn record_miss(&mut self) {
        self.get_calls += 1;
        self.misses += 1;
    }

    fn record_compute_failure(&mut self) {
        self.compute_failures += 1;
    }

    fn record_insert(&mut self) {
        self.inserts += 1;
    }
}

impl BoundedMetricsRecorder for MemoMetrics {
    fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    fn record_uncached_miss(&mut self) {
        self.uncached_misses += 1;
    }
}

impl ReclaimMetricsRecorder for MemoMetrics {
    fn record_sweep(&mut self, purged: usize) {
        self.sweeps += 1;
        self.swept_entries += purged as u64;
    }

    fn record_stale_replaced(&mut self) {
        self.stale_replaced += 1;
    }
}
