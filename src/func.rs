//! # Cached Function Adapters
//!
//! Wrap an origin computation and a [`Memoizer`] into something that looks
//! like the origin again. Each adapter builds the key for its arity, asks the
//! memoizer, and only calls the origin on a miss. No adapter adds policy of
//! its own.
//!
//! | Adapter          | Origin            | Key                               |
//! |------------------|-------------------|-----------------------------------|
//! | [`CachedBiFunc`] | [`BiFunc<X, Y>`]  | `ArgPair<X, Y>`                   |
//! | [`CachedFunc`]   | [`Func<X>`]       | `ArgPair<Placeholder, X>`         |
//! | [`CachedScalar`] | [`Scalar`]        | `ArgPair<Placeholder, Placeholder>` |
//! | [`CachedText`]   | [`Text`]          | `ArgPair<Placeholder, Placeholder>` |
//! | [`WeakFunc`]     | [`Func<K>`]       | `Arc<K>`, held weakly             |
//!
//! Adapters implement the same origin trait they wrap, so a cached function
//! can be passed anywhere the plain one is accepted.
//!
//! ## Example
//!
//! ```
//! use memokit::func::CachedBiFunc;
//! use memokit::traits::BiFunc;
//!
//! let mut calls = 0;
//! let mut pow = CachedBiFunc::bounded(
//!     |base: &u64, exp: &u32| {
//!         calls += 1;
//!         base.checked_pow(*exp).ok_or("overflow")
//!     },
//!     16,
//! );
//!
//! assert_eq!(pow.apply(&2, &10), Ok(1024));
//! assert_eq!(pow.apply(&2, &10), Ok(1024));
//! assert_eq!(pow.apply(&u64::MAX, &2), Err("overflow"));
//! drop(pow);
//! assert_eq!(calls, 2);
//! ```

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use crate::key::{ArgPair, NullaryKey, UnaryKey};
use crate::policy::bounded_hits::BoundedHitCache;
use crate::policy::reclaimable::ReclaimableCache;
use crate::policy::weak_key::WeakKeyStore;
use crate::reclaim::MemoryPressure;
use crate::traits::{BiFunc, Func, Memoizer, Scalar, Text};

// ---------------------------------------------------------------------------
// CachedBiFunc
// ---------------------------------------------------------------------------

/// Memoized two-argument function.
#[derive(Debug)]
pub struct CachedBiFunc<M, F> {
    memo: M,
    origin: F,
}

impl<M, F> CachedBiFunc<M, F> {
    /// Wraps `origin` with a caller-supplied memoizer.
    pub fn with_memo(origin: F, memo: M) -> Self {
        Self { memo, origin }
    }

    pub fn memo(&self) -> &M {
        &self.memo
    }
}

impl<X, Y, F> CachedBiFunc<BoundedHitCache<ArgPair<X, Y>, F::Output>, F>
where
    X: Eq + Hash + Clone,
    Y: Eq + Hash + Clone,
    F: BiFunc<X, Y>,
{
    /// Keeps at most `capacity` results, evicting the least-hit one.
    pub fn bounded(origin: F, capacity: usize) -> Self {
        Self::with_memo(origin, BoundedHitCache::new(capacity))
    }
}

impl<X, Y, F> CachedBiFunc<ReclaimableCache<ArgPair<X, Y>, F::Output>, F>
where
    X: Eq + Hash + Clone,
    Y: Eq + Hash + Clone,
    F: BiFunc<X, Y>,
    F::Output: Send + Sync + 'static,
{
    pub fn reclaimable(origin: F) -> Self {
        Self::with_memo(origin, ReclaimableCache::new())
    }

    pub fn reclaimable_with(origin: F, pressure: MemoryPressure) -> Self {
        Self::with_memo(origin, ReclaimableCache::with_pressure(pressure))
    }
}

impl<X, Y, M, F> BiFunc<X, Y> for CachedBiFunc<M, F>
where
    X: Clone,
    Y: Clone,
    F: BiFunc<X, Y>,
    M: Memoizer<ArgPair<X, Y>, F::Output>,
{
    type Output = M::Output;
    type Error = F::Error;

    fn apply(&mut self, first: &X, second: &Y) -> Result<M::Output, F::Error> {
        let Self { memo, origin } = self;
        memo.get_or_compute(ArgPair::new(first.clone(), second.clone()), |key| {
            origin.apply(key.first(), key.second())
        })
    }
}

// ---------------------------------------------------------------------------
// CachedFunc
// ---------------------------------------------------------------------------

/// Memoized one-argument function.
#[derive(Debug)]
pub struct CachedFunc<M, F> {
    memo: M,
    origin: F,
}

impl<M, F> CachedFunc<M, F> {
    pub fn with_memo(origin: F, memo: M) -> Self {
        Self { memo, origin }
    }

    pub fn memo(&self) -> &M {
        &self.memo
    }
}

impl<X, F> CachedFunc<BoundedHitCache<UnaryKey<X>, F::Output>, F>
where
    X: Eq + Hash + Clone,
    F: Func<X>,
{
    pub fn bounded(origin: F, capacity: usize) -> Self {
        Self::with_memo(origin, BoundedHitCache::new(capacity))
    }
}

impl<X, F> CachedFunc<ReclaimableCache<UnaryKey<X>, F::Output>, F>
where
    X: Eq + Hash + Clone,
    F: Func<X>,
    F::Output: Send + Sync + 'static,
{
    pub fn reclaimable(origin: F) -> Self {
        Self::with_memo(origin, ReclaimableCache::new())
    }

    pub fn reclaimable_with(origin: F, pressure: MemoryPressure) -> Self {
        Self::with_memo(origin, ReclaimableCache::with_pressure(pressure))
    }
}

impl<X, M, F> Func<X> for CachedFunc<M, F>
where
    X: Clone,
    F: Func<X>,
    M: Memoizer<UnaryKey<X>, F::Output>,
{
    type Output = M::Output;
    type Error = F::Error;

    fn apply(&mut self, arg: &X) -> Result<M::Output, F::Error> {
        let Self { memo, origin } = self;
        memo.get_or_compute(ArgPair::unary(arg.clone()), |key| origin.apply(key.second()))
    }
}

// ---------------------------------------------------------------------------
// CachedScalar
// ---------------------------------------------------------------------------

/// Memoized zero-argument computation.
///
/// With a reclaimable memo this is a lazily recomputed value: it stays cached
/// until memory pressure drops it.
#[derive(Debug)]
pub struct CachedScalar<M, F> {
    memo: M,
    origin: F,
}

impl<M, F> CachedScalar<M, F> {
    pub fn with_memo(origin: F, memo: M) -> Self {
        Self { memo, origin }
    }

    pub fn memo(&self) -> &M {
        &self.memo
    }
}

impl<F> CachedScalar<BoundedHitCache<NullaryKey, F::Output>, F>
where
    F: Scalar,
{
    pub fn bounded(origin: F, capacity: usize) -> Self {
        Self::with_memo(origin, BoundedHitCache::new(capacity))
    }
}

impl<F> CachedScalar<ReclaimableCache<NullaryKey, F::Output>, F>
where
    F: Scalar,
    F::Output: Send + Sync + 'static,
{
    pub fn reclaimable(origin: F) -> Self {
        Self::with_memo(origin, ReclaimableCache::new())
    }

    pub fn reclaimable_with(origin: F, pressure: MemoryPressure) -> Self {
        Self::with_memo(origin, ReclaimableCache::with_pressure(pressure))
    }
}

impl<M, F> Scalar for CachedScalar<M, F>
where
    F: Scalar,
    M: Memoizer<NullaryKey, F::Output>,
{
    type Output = M::Output;
    type Error = F::Error;

    fn value(&mut self) -> Result<M::Output, F::Error> {
        let Self { memo, origin } = self;
        memo.get_or_compute(ArgPair::nullary(), |_| origin.value())
    }
}

// ---------------------------------------------------------------------------
// CachedText
// ---------------------------------------------------------------------------

/// Memoized text. Hands out owned copies equal by content to the cached one.
#[derive(Debug)]
pub struct CachedText<M, F> {
    memo: M,
    origin: F,
}

impl<M, F> CachedText<M, F> {
    pub fn with_memo(origin: F, memo: M) -> Self {
        Self { memo, origin }
    }

    pub fn memo(&self) -> &M {
        &self.memo
    }
}

impl<F: Text> CachedText<BoundedHitCache<NullaryKey, String>, F> {
    pub fn bounded(origin: F, capacity: usize) -> Self {
        Self::with_memo(origin, BoundedHitCache::new(capacity))
    }
}

impl<F: Text> CachedText<ReclaimableCache<NullaryKey, String>, F> {
    pub fn reclaimable(origin: F) -> Self {
        Self::with_memo(origin, ReclaimableCache::new())
    }

    pub fn reclaimable_with(origin: F, pressure: MemoryPressure) -> Self {
        Self::with_memo(origin, ReclaimableCache::with_pressure(pressure))
    }
}

impl<M, F> Text for CachedText<M, F>
where
    F: Text,
    M: Memoizer<NullaryKey, String>,
    M::Output: Borrow<String>,
{
    type Error = F::Error;

    fn as_string(&mut self) -> Result<String, F::Error> {
        let Self { memo, origin } = self;
        let cached = memo.get_or_compute(ArgPair::nullary(), |_| origin.as_string())?;
        Ok(Borrow::<String>::borrow(&cached).clone())
    }
}

// ---------------------------------------------------------------------------
// WeakFunc
// ---------------------------------------------------------------------------

/// Memoized one-argument function whose entries live as long as their key.
///
/// ```
/// use std::sync::Arc;
/// use memokit::func::WeakFunc;
/// use memokit::traits::{Func, Memoizer};
///
/// let mut word_count = WeakFunc::new(|s: &String| Ok::<_, ()>(s.split_whitespace().count()));
/// let doc = Arc::new(String::from("one two three"));
///
/// assert_eq!(word_count.apply(&doc), Ok(3));
/// assert_eq!(word_count.store().len(), 1);
/// drop(doc);
/// assert_eq!(word_count.store().len(), 0);
/// ```
#[derive(Debug)]
pub struct WeakFunc<K, V, F> {
    store: WeakKeyStore<K, V>,
    origin: F,
}

impl<K, V, F> WeakFunc<K, V, F>
where
    K: Eq + Hash,
    F: Func<K, Output = V>,
{
    pub fn new(origin: F) -> Self {
        Self {
            store: WeakKeyStore::new(),
            origin,
        }
    }

    pub fn store(&self) -> &WeakKeyStore<K, V> {
        &self.store
    }
}

impl<K, V, F> Func<Arc<K>> for WeakFunc<K, V, F>
where
    K: Eq + Hash,
    V: Clone,
    F: Func<K, Output = V>,
{
    type Output = V;
    type Error = F::Error;

    fn apply(&mut self, key: &Arc<K>) -> Result<V, F::Error> {
        let Self { store, origin } = self;
        store.get_or_compute(Arc::clone(key), |key| origin.apply(key))
    }
}
