//! # Reclaimable Memoizer
//!
//! An unbounded memo table whose values can be dropped under memory
//! pressure. Each value lives in a [`MemoryPressure`] registry; the table only
//! keeps a [`SoftSlot`]. A lookup whose slot has been reclaimed recomputes.
//! Every successful lookup, hit or miss, sweeps out entries whose slots have
//! emptied and reports each one to an optional [`ReclaimSink`].
//!
//! ## Lookup Flow
//!
//! ```text
//!   get_or_compute(key, compute)
//!        │
//!        ▼
//!   slot for key upgrades? ── YES ──► touch slot, sweep, return same Arc<V>
//!        │ NO (absent or reclaimed)
//!        ▼
//!   value = compute(&key)?            (error: table untouched, no sweep)
//!        │
//!        ▼
//!   drop stale slot for key ──► sink.notify(key, slot)
//!   admit value to pressure, insert new slot
//!        │
//!        ▼
//!   sweep: purge every reclaimed slot ──► sink.notify(key, slot) each
//!        │
//!        ▼
//!   return Arc<V>
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use memokit::policy::reclaimable::ReclaimableCache;
//! use memokit::reclaim::{MemoryPressure, ReclaimQueue};
//! use memokit::traits::Memoizer;
//!
//! let pressure = MemoryPressure::new();
//! let queue = ReclaimQueue::new();
//! let mut cache = ReclaimableCache::with_pressure(pressure.clone()).with_sink(queue.clone());
//!
//! let first = cache.get_or_compute(1u32, |k| Ok::<_, ()>(k * 100)).unwrap();
//! let again = cache.get_or_compute(1u32, |_| Ok::<_, ()>(0)).unwrap();
//! assert!(Arc::ptr_eq(&first, &again));
//!
//! drop((first, again));
//! pressure.reclaim();
//! assert!(!cache.contains(&1));
//!
//! cache.get_or_compute(2u32, |k| Ok::<_, ()>(k * 100)).unwrap();
//! assert_eq!(queue.poll().map(|n| n.key), Some(1));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::MemoMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::MemoMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsSnapshotProvider, ReclaimMetricsRecorder,
};
use crate::reclaim::{MemoryPressure, ReclaimSink, Reclaimed, SlotId, SoftSlot};
use crate::traits::Memoizer;

/// Memo table whose values may be reclaimed under memory pressure.
pub struct ReclaimableCache<K, V>
where
    K: Eq + Hash + Clone,
{
    slots: FxHashMap<K, SoftSlot<V>>,
    pressure: MemoryPressure,
    sink: Option<Box<dyn ReclaimSink<K> + Send>>,
    #[cfg(feature = "metrics")]
    metrics: MemoMetrics,
}

impl<K, V> ReclaimableCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    /// Creates a cache with a private pressure handle using the default policy.
    pub fn new() -> Self {
        Self::with_pressure(MemoryPressure::new())
    }

    /// Creates a cache whose values are registered with `pressure`.
    pub fn with_pressure(pressure: MemoryPressure) -> Self {
        Self {
            slots: FxHashMap::default(),
            pressure,
            sink: None,
            #[cfg(feature = "metrics")]
            metrics: MemoMetrics::default(),
        }
    }

    /// Routes purge notices to `sink`.
    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: ReclaimSink<K> + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn pressure(&self) -> &MemoryPressure {
        &self.pressure
    }

    /// Stored value for `key` if it is still live, without touching it.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.slots.get(key).and_then(SoftSlot::upgrade)
    }

    /// Purges every entry whose value has been reclaimed. Returns the count.
    pub fn sweep(&mut self) -> usize {
        let mut purged: Vec<(K, SlotId)> = Vec::new();
        self.slots.retain(|key, slot| {
            if slot.is_reclaimed() {
                purged.push((key.clone(), slot.id()));
                false
            } else {
                true
            }
        });

        let count = purged.len();
        if count > 0 {
            debug!(purged = count, remaining = self.slots.len(), "swept reclaimed entries");
        }
        for (key, slot) in purged {
            self.notify(key, slot);
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_sweep(count);
        count
    }

    fn notify(&self, key: K, slot: SlotId) {
        if let Some(sink) = &self.sink {
            sink.notify(Reclaimed { key, slot });
        }
    }
}

impl<K, V> Default for ReclaimableCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Memoizer<K, V> for ReclaimableCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    type Output = Arc<V>;

    fn get_or_compute<E, F>(&mut self, key: K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let live = self.slots.get(&key).and_then(|slot| {
            let value = slot.upgrade()?;
            slot.touch();
            Some(value)
        });
        if let Some(value) = live {
            trace!("reclaimable hit");
            #[cfg(feature = "metrics")]
            self.metrics.record_hit();
            self.sweep();
            return Ok(value);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_miss();
        trace!(len = self.slots.len(), "reclaimable miss");

        let value = match compute(&key) {
            Ok(value) => Arc::new(value),
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_compute_failure();
                return Err(err);
            },
        };

        if let Some((stale_key, stale)) = self.slots.remove_entry(&key) {
            let slot = stale.id();
            drop(stale);
            self.notify(stale_key, slot);
            #[cfg(feature = "metrics")]
            self.metrics.record_stale_replaced();
        }

        let slot = self.pressure.admit(Arc::clone(&value));
        self.slots.insert(key, slot);
        #[cfg(feature = "metrics")]
        self.metrics.record_insert();

        self.sweep();
        Ok(value)
    }

    fn contains(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|slot| !slot.is_reclaimed())
    }

    /// Entries in the table, counting reclaimed ones not yet swept.
    fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<MemoMetricsSnapshot> for ReclaimableCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> MemoMetricsSnapshot {
        self.metrics.to_snapshot(self.slots.len(), None)
    }
}

impl<K, V> fmt::Debug for ReclaimableCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclaimableCache")
            .field("len", &self.slots.len())
            .field("pressure", &self.pressure)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
