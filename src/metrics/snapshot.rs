/// Point-in-time view of a memoizer's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoMetricsSnapshot {
    pub get_calls: u64,
    pub hits: u64,
    pub misses: u64,
    pub compute_failures: u64,
    pub inserts: u64,

    // bounded engine
    pub evictions: u64,
    pub uncached_misses: u64, // capacity 0: computed but never stored

    // reclaimable engine
    pub sweeps: u64,
    pub swept_entries: u64,
    pub stale_replaced: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: Option<usize>,
}

impl MemoMetricsSnapshot {
    /// Fraction of lookups served from the table, or `None` before any call.
    pub fn hit_ratio(&self) -> Option<f64> {
        if self.get_calls == 0 {
            None
        } else {
            Some(self.hits as f64 / self.get_calls as f64)
        }
    }
}
