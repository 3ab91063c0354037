//! Unified memoizer builder.
//!
//! Picks an engine from a small set of settings and hides the difference in
//! return types: both engines come back as a [`Memo`] handing out `Arc<V>`.
//!
//! | Settings                     | Engine                                   |
//! |------------------------------|------------------------------------------|
//! | nothing                      | reclaimable, private pressure            |
//! | `capacity(n)`                | bounded by hit count, `n` entries        |
//! | `pressure(p)`                | reclaimable, registered with `p`         |
//! | `policy(..)`                 | exactly that policy                      |
//! | `capacity` + `pressure`      | [`ConfigError`]                          |
//!
//! ## Example
//!
//! ```rust
//! use memokit::builder::MemoBuilder;
//! use memokit::traits::Memoizer;
//!
//! let mut memo = MemoBuilder::new().capacity(64).try_build::<u64, String>().unwrap();
//! let v = memo.get_or_compute(7, |k| Ok::<_, ()>(k.to_string())).unwrap();
//! assert_eq!(v.as_str(), "7");
//! assert_eq!(memo.capacity(), Some(64));
//! ```

use std::hash::Hash;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::policy::bounded_hits::BoundedHitCache;
use crate::policy::reclaimable::ReclaimableCache;
use crate::reclaim::MemoryPressure;
use crate::traits::Memoizer;

/// Available memoization policies.
#[derive(Debug, Clone)]
pub enum MemoPolicy {
    /// Fixed capacity; evicts the entry with the fewest hits.
    BoundedHits { capacity: usize },
    /// Unbounded; values drop under memory pressure. `None` gives the memo a
    /// private pressure handle.
    Reclaimable { pressure: Option<MemoryPressure> },
}

/// Memoizer wrapper with one API regardless of policy.
pub struct Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    inner: MemoInner<K, V>,
}

enum MemoInner<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    Bounded(BoundedHitCache<K, Arc<V>>),
    Reclaimable(ReclaimableCache<K, V>),
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    /// Entry limit for the bounded policy; `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match &self.inner {
            MemoInner::Bounded(cache) => Some(cache.capacity()),
            MemoInner::Reclaimable(_) => None,
        }
    }

    /// Pressure handle for the reclaimable policy.
    pub fn pressure(&self) -> Option<&MemoryPressure> {
        match &self.inner {
            MemoInner::Bounded(_) => None,
            MemoInner::Reclaimable(cache) => Some(cache.pressure()),
        }
    }
}

impl<K, V> Memoizer<K, V> for Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
{
    type Output = Arc<V>;

    fn get_or_compute<E, F>(&mut self, key: K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        match &mut self.inner {
            MemoInner::Bounded(cache) => cache.get_or_compute(key, |k| compute(k).map(Arc::new)),
            MemoInner::Reclaimable(cache) => cache.get_or_compute(key, compute),
        }
    }

    fn contains(&self, key: &K) -> bool {
        match &self.inner {
            MemoInner::Bounded(cache) => cache.contains(key),
            MemoInner::Reclaimable(cache) => cache.contains(key),
        }
    }

    fn len(&self) -> usize {
        match &self.inner {
            MemoInner::Bounded(cache) => cache.len(),
            MemoInner::Reclaimable(cache) => cache.len(),
        }
    }
}

/// Builder for [`Memo`] instances.
#[derive(Debug, Clone, Default)]
pub struct MemoBuilder {
    capacity: Option<usize>,
    pressure: Option<MemoryPressure>,
    policy: Option<MemoPolicy>,
}

impl MemoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the memo to `capacity` entries. 0 disables storage.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Like [`capacity`](Self::capacity), for signed input from config files
    /// or FFI. Negative values are rejected.
    pub fn try_capacity(self, capacity: i64) -> Result<Self, ConfigError> {
        let capacity = usize::try_from(capacity)
            .map_err(|_| ConfigError::new(format!("capacity must be >= 0, got {capacity}")))?;
        Ok(self.capacity(capacity))
    }

    /// Registers values with a shared pressure handle.
    pub fn pressure(mut self, pressure: MemoryPressure) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Sets the policy directly. Cannot be combined with `capacity` or
    /// `pressure`.
    pub fn policy(mut self, policy: MemoPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Resolves the settings into a single policy.
    pub fn resolve(self) -> Result<MemoPolicy, ConfigError> {
        match (self.policy, self.capacity, self.pressure) {
            (Some(policy), None, None) => Ok(policy),
            (Some(_), _, _) => Err(ConfigError::new(
                "an explicit policy cannot be combined with capacity or pressure",
            )),
            (None, Some(_), Some(_)) => Err(ConfigError::new(
                "capacity and pressure select conflicting policies; set only one",
            )),
            (None, Some(capacity), None) => Ok(MemoPolicy::BoundedHits { capacity }),
            (None, None, pressure) => Ok(MemoPolicy::Reclaimable { pressure }),
        }
    }

    /// Builds the memo.
    ///
    /// ```rust
    /// use memokit::builder::{MemoBuilder, MemoPolicy};
    /// use memokit::reclaim::MemoryPressure;
    ///
    /// let memo = MemoBuilder::new()
    ///     .policy(MemoPolicy::BoundedHits { capacity: 8 })
    ///     .try_build::<u32, u32>()
    ///     .unwrap();
    /// assert_eq!(memo.capacity(), Some(8));
    ///
    /// let conflict = MemoBuilder::new()
    ///     .capacity(8)
    ///     .pressure(MemoryPressure::new())
    ///     .try_build::<u32, u32>();
    /// assert!(conflict.is_err());
    /// ```
    pub fn try_build<K, V>(self) -> Result<Memo<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Send + Sync + 'static,
    {
        let inner = match self.resolve()? {
            MemoPolicy::BoundedHits { capacity } => MemoInner::Bounded(BoundedHitCache::new(capacity)),
            MemoPolicy::Reclaimable { pressure } => MemoInner::Reclaimable(match pressure {
                Some(pressure) => ReclaimableCache::with_pressure(pressure),
                None => ReclaimableCache::new(),
            }),
        };
        Ok(Memo { inner })
    }
}
