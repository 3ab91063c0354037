//! Weak-key memo store.
//!
//! Entries live exactly as long as their key: the store holds each key through
//! a `Weak<K>`, so once every caller's `Arc<K>` is gone the entry is dead and
//! gets expunged on the next call. Keys are matched structurally, not by
//! pointer: a fresh `Arc` of an equal key finds the existing entry.
//!
//! ```text
//!   entries: FxHashMap<WeakKey<K>, V>
//!
//!   WeakKey { hash: u64 (of K, fixed at insert), key: Weak<K> }
//!     Hash  → the stored hash, so dead keys stay findable for removal
//!     Eq    → same allocation, or both alive and K == K
//! ```
//!
//! No capacity bound and no manual invalidation.

use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Weak};

use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::trace;

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::MemoMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::MemoMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{CoreMetricsRecorder, MetricsSnapshotProvider};
use crate::traits::Memoizer;

struct WeakKey<K> {
    hash: u64,
    key: Weak<K>,
}

impl<K> WeakKey<K> {
    fn is_alive(&self) -> bool {
        self.key.strong_count() > 0
    }
}

impl<K> Hash for WeakKey<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<K: Eq> PartialEq for WeakKey<K> {
    fn eq(&self, other: &Self) -> bool {
        if Weak::ptr_eq(&self.key, &other.key) {
            return true;
        }
        match (self.key.upgrade(), other.key.upgrade()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl<K: Eq> Eq for WeakKey<K> {}

/// Memo store keyed by `Arc<K>`, holding keys weakly.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use memokit::policy::weak_key::WeakKeyStore;
/// use memokit::traits::Memoizer;
///
/// let mut store = WeakKeyStore::new();
/// let key = Arc::new(String::from("config"));
///
/// let len = store.get_or_compute(Arc::clone(&key), |k| Ok::<_, ()>(k.len())).unwrap();
/// assert_eq!(len, 6);
///
/// // An equal key in a different allocation hits the same entry.
/// assert!(store.contains(&Arc::new(String::from("config"))));
///
/// drop(key);
/// assert_eq!(store.len(), 0);
/// ```
pub struct WeakKeyStore<K, V> {
    entries: FxHashMap<WeakKey<K>, V>,
    #[cfg(feature = "metrics")]
    metrics: MemoMetrics,
}

impl<K, V> WeakKeyStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            #[cfg(feature = "metrics")]
            metrics: MemoMetrics::default(),
        }
    }

    /// Removes entries whose key has been dropped. Returns how many.
    pub fn expunge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.is_alive());
        before - self.entries.len()
    }

    /// Entries held, dead keys included, until the next expunge.
    pub fn raw_len(&self) -> usize {
        self.entries.len()
    }

    fn probe(key: &Arc<K>) -> WeakKey<K> {
        WeakKey {
            hash: FxBuildHasher.hash_one(&**key),
            key: Arc::downgrade(key),
        }
    }
}

impl<K, V> Default for WeakKeyStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Memoizer<Arc<K>, V> for WeakKeyStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    type Output = V;

    fn get_or_compute<E, F>(&mut self, key: Arc<K>, compute: F) -> Result<V, E>
    where
        F: FnOnce(&Arc<K>) -> Result<V, E>,
    {
        let expunged = self.expunge();
        if expunged > 0 {
            trace!(expunged, "dropped entries with dead keys");
        }

        let probe = Self::probe(&key);
        if let Some(value) = self.entries.get(&probe) {
            #[cfg(feature = "metrics")]
            self.metrics.record_hit();
            return Ok(value.clone());
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_miss();
        let value = match compute(&key) {
            Ok(value) => value,
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_compute_failure();
                return Err(err);
            },
        };

        self.entries.insert(probe, value.clone());
        #[cfg(feature = "metrics")]
        self.metrics.record_insert();
        Ok(value)
    }

    fn contains(&self, key: &Arc<K>) -> bool {
        self.entries.contains_key(&Self::probe(key))
    }

    /// Entries whose key is still alive.
    fn len(&self) -> usize {
        self.entries.keys().filter(|key| key.is_alive()).count()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<MemoMetricsSnapshot> for WeakKeyStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn snapshot(&self) -> MemoMetricsSnapshot {
        self.metrics.to_snapshot(self.len(), None)
    }
}

impl<K, V> fmt::Debug for WeakKeyStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakKeyStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}
