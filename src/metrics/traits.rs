//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are kept apart so engines only ever
//! write counters and never know who reads them.
//!
//! ```text
//!                 ┌─────────────────────────────┐
//!                 │     CoreMetricsRecorder     │
//!                 │  hit / miss / failure       │
//!                 │  insert / eviction          │
//!                 └──────────────┬──────────────┘
//!                                │
//!              ┌─────────────────┴─────────────────┐
//!              ▼                                   ▼
//!   ┌──────────────────────┐            ┌──────────────────────┐
//!   │ BoundedMetrics-      │            │ ReclaimMetrics-      │
//!   │ Recorder             │            │ Recorder             │
//!   │ loser evictions      │            │ sweeps, stale swaps  │
//!   └──────────────────────┘            └──────────────────────┘
//!
//!   Consumption:
//!   ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │
//!   └──────────────────────────────┘
//! ```

/// Counters shared by every memoizer.
pub trait CoreMetricsRecorder {
    fn record_hit(&mut self);
    fn record_miss(&mut self);
    fn record_compute_failure(&mut self);
    fn record_insert(&mut self);
}

/// Counters specific to the hit-count bounded engine.
pub trait BoundedMetricsRecorder: CoreMetricsRecorder {
    fn record_eviction(&mut self);
    fn record_uncached_miss(&mut self);
}

/// Counters specific to the reclaimable engine.
pub trait ReclaimMetricsRecorder: CoreMetricsRecorder {
    fn record_sweep(&mut self, purged: usize);
    fn record_stale_replaced(&mut self);
}

/// Snapshot provider for tests and benches.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
