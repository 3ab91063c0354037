//! # Hit-Count Bounded Memoizer
//!
//! A fixed-capacity memo table that, when full, evicts the entry with the
//! fewest recorded hits. Ties go to the entry that arrived first.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                        BoundedHitCache<K, V>                             │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  values: FxHashMap<K, V>                                           │ │
//!   │   │                                                                    │ │
//!   │   │  ┌──────────────┬────────────────────────────────────────────────┐ │ │
//!   │   │  │ ArgPair(2,3) │  8                                             │ │ │
//!   │   │  │ ArgPair(4,1) │  4                                             │ │ │
//!   │   │  └──────────────┴────────────────────────────────────────────────┘ │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  ledger: HitLedger<K>   key → (hits, arrival) + lazy min-heap      │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   capacity: usize                                                        │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lookup Flow
//!
//! ```text
//!   get_or_compute(key, compute)
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ Key resident?                                                          │
//!   │   YES → hits += 1, return stored value (compute not called)            │
//!   │   NO  → value = compute(&key)?   (error: table untouched)              │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ capacity == 0 → return value, store nothing                            │
//!   │ len == capacity → evict loser (min hits, earliest arrival on ties)     │
//!   │ insert key with hits = 1, return value                                 │
//!   └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Worked Example
//!
//! ```text
//!   capacity = 2
//!   A (miss)  → {A:1}
//!   B (miss)  → {A:1, B:1}
//!   A (hit)   → {A:2, B:1}
//!   C (miss)  → B loses (1 hit) → {A:2, C:1}
//! ```
//!
//! ## Performance
//!
//! | Operation            | Time          | Notes                              |
//! |----------------------|---------------|------------------------------------|
//! | hit                  | O(log n)      | map lookup + heap push             |
//! | miss, no eviction    | O(log n)      | compute + insert                   |
//! | miss with eviction   | O(log n) amortized | stale heap entries skipped    |
//! | `loser()`            | O(n)          | scan of authoritative ranks        |
//!
//! ## Thread Safety
//!
//! Not thread-safe. Wrap in `SharedMemo` (feature `concurrency`) or an
//! external mutex.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ds::HitLedger;
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::MemoMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::MemoMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    BoundedMetricsRecorder, CoreMetricsRecorder, MetricsSnapshotProvider,
};
use crate::traits::Memoizer;

/// Memo table bounded by entry count, evicting the least-hit entry.
///
/// # Example
///
/// ```
/// use memokit::key::ArgPair;
/// use memokit::policy::bounded_hits::BoundedHitCache;
/// use memokit::traits::Memoizer;
///
/// let mut cache = BoundedHitCache::new(2);
/// let mul = |k: &ArgPair<u32, u32>| Ok::<_, ()>(k.first() * k.second());
///
/// cache.get_or_compute(ArgPair::new(2, 3), mul).unwrap();
/// cache.get_or_compute(ArgPair::new(4, 5), mul).unwrap();
/// cache.get_or_compute(ArgPair::new(2, 3), mul).unwrap();
/// cache.get_or_compute(ArgPair::new(6, 7), mul).unwrap();
///
/// assert!(cache.contains(&ArgPair::new(2, 3)));
/// assert!(!cache.contains(&ArgPair::new(4, 5)));
/// assert_eq!(cache.hits(&ArgPair::new(2, 3)), Some(2));
/// ```
#[derive(Debug)]
pub struct BoundedHitCache<K, V>
where
    K: Eq + Hash + Clone,
{
    values: FxHashMap<K, V>,
    ledger: HitLedger<K>,
    capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: MemoMetrics,
}

impl<K, V> BoundedHitCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of 0 is allowed and disables caching: every call computes.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ledger: HitLedger::with_capacity(capacity),
            capacity,
            #[cfg(feature = "metrics")]
            metrics: MemoMetrics::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hit count of a resident key; 1 right after insertion.
    pub fn hits(&self, key: &K) -> Option<u64> {
        self.ledger.hits(key)
    }

    /// Stored value for `key`, without recording a hit.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// The key that the next overflowing insert would evict, with its hits.
    pub fn loser(&self) -> Option<(&K, u64)> {
        self.ledger.peek_loser().map(|(key, rank)| (key, rank.hits))
    }

    /// Iterates over resident keys and their hit counts, in no particular order.
    pub fn iter_hits(&self) -> impl Iterator<Item = (&K, u64)> + '_ {
        self.values
            .keys()
            .filter_map(|key| self.ledger.hits(key).map(|hits| (key, hits)))
    }

    /// Verifies the table and the hit ledger agree and capacity holds.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.values.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "table holds {} entries, capacity is {}",
                self.values.len(),
                self.capacity
            )));
        }
        if self.values.len() != self.ledger.len() {
            return Err(InvariantError::new(format!(
                "table holds {} entries, hit ledger tracks {}",
                self.values.len(),
                self.ledger.len()
            )));
        }
        if self.values.keys().any(|key| self.ledger.hits(key).is_none()) {
            return Err(InvariantError::new("resident key missing from hit ledger"));
        }
        self.ledger.check_invariants()
    }

    fn evict_loser(&mut self) {
        if let Some((loser, rank)) = self.ledger.pop_loser() {
            self.values.remove(&loser);
            debug!(
                hits = rank.hits,
                arrival = rank.arrival,
                capacity = self.capacity,
                "evicted least-hit entry"
            );
            #[cfg(feature = "metrics")]
            self.metrics.record_eviction();
        }
    }
}

impl<K, V> Memoizer<K, V> for BoundedHitCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    type Output = V;

    fn get_or_compute<E, F>(&mut self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(value) = self.values.get(&key) {
            let hits = self.ledger.record_hit(&key);
            trace!(?hits, "bounded hit");
            #[cfg(feature = "metrics")]
            self.metrics.record_hit();
            return Ok(value.clone());
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_miss();
        trace!(len = self.values.len(), "bounded miss");

        let value = match compute(&key) {
            Ok(value) => value,
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_compute_failure();
                return Err(err);
            },
        };

        if self.capacity == 0 {
            #[cfg(feature = "metrics")]
            self.metrics.record_uncached_miss();
            return Ok(value);
        }

        if self.values.len() >= self.capacity {
            self.evict_loser();
        }

        self.ledger.admit(key.clone());
        self.values.insert(key, value.clone());
        #[cfg(feature = "metrics")]
        self.metrics.record_insert();

        Ok(value)
    }

    fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<MemoMetricsSnapshot> for BoundedHitCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> MemoMetricsSnapshot {
        self.metrics
            .to_snapshot(self.values.len(), Some(self.capacity))
    }
}

// ==============================================
// BOUNDED HIT CACHE TESTS
// ==============================================
