//! # Memoizer and Origin Traits
//!
//! Two families of traits meet here:
//!
//! - [`Memoizer`]: the shared cache primitive. Given a key, return a cached
//!   value or compute-and-store one. Every engine implements it.
//! - Origin traits ([`BiFunc`], [`Func`], [`Scalar`], [`Text`]): the shapes of
//!   computation being memoized. Closures returning `Result` implement them
//!   directly, and the cached adapters in [`crate::func`] implement them too,
//!   so caches compose like any other function.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                        Memoizer<K, V>                                │
//!   │                                                                      │
//!   │  get_or_compute(&mut, K, FnOnce(&K) -> Result<V, E>)                 │
//!   │      → Result<Output, E>                                             │
//!   │  contains(&, &K) → bool                                              │
//!   │  len(&) → usize                                                      │
//!   └──────────────┬───────────────────────┬───────────────────────┬───────┘
//!                  │                       │                       │
//!                  ▼                       ▼                       ▼
//!   ┌──────────────────────┐ ┌───────────────────────┐ ┌──────────────────────┐
//!   │ BoundedHitCache<K,V> │ │ ReclaimableCache<K,V> │ │ WeakKeyStore<K,V>    │
//!   │ Output = V           │ │ Output = Arc<V>       │ │ key = Arc<K>         │
//!   │ evicts fewest hits   │ │ sweeps reclaimed slots│ │ Output = V           │
//!   └──────────────────────┘ └───────────────────────┘ └──────────────────────┘
//!
//!   Origins (what gets memoized)
//!   ┌──────────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐
//!   │ BiFunc<X, Y> │  │ Func<X>  │  │ Scalar   │  │ Text     │
//!   │ (&X, &Y)     │  │ (&X)     │  │ ()       │  │ () → Str │
//!   └──────────────┘  └──────────┘  └──────────┘  └──────────┘
//! ```
//!
//! ## Failure Semantics
//!
//! `get_or_compute` returns the compute closure's error unchanged. A failed
//! compute never leaves a partial entry behind: implementations run the
//! closure before touching their table.

/// The shared cache primitive.
///
/// `Output` is what a lookup hands back: the value itself for engines that
/// own their values outright, or a shared handle (`Arc<V>`) for engines whose
/// values can be reclaimed while callers still hold them.
///
/// # Example
///
/// ```
/// use memokit::policy::bounded_hits::BoundedHitCache;
/// use memokit::traits::Memoizer;
///
/// let mut cache = BoundedHitCache::new(8);
/// let v: Result<u64, ()> = cache.get_or_compute(3u64, |k| Ok(k * k));
/// assert_eq!(v, Ok(9));
///
/// // Second lookup is served from the table; the closure is not called.
/// let v: Result<u64, ()> = cache.get_or_compute(3u64, |_| unreachable!());
/// assert_eq!(v, Ok(9));
/// ```
pub trait Memoizer<K, V> {
    type Output;

    /// Returns the cached value for `key`, or runs `compute` and stores its
    /// result according to the engine's policy.
    fn get_or_compute<E, F>(&mut self, key: K, compute: F) -> Result<Self::Output, E>
    where
        F: FnOnce(&K) -> Result<V, E>;

    /// Checks whether `key` would currently be served without computing.
    ///
    /// Never updates hit accounting or recency.
    fn contains(&self, key: &K) -> bool;

    /// Number of entries currently in the table.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A two-argument computation that may fail.
pub trait BiFunc<X, Y> {
    type Output;
    type Error;

    fn apply(&mut self, first: &X, second: &Y) -> Result<Self::Output, Self::Error>;
}

impl<X, Y, Z, E, F> BiFunc<X, Y> for F
where
    F: FnMut(&X, &Y) -> Result<Z, E>,
{
    type Output = Z;
    type Error = E;

    #[inline]
    fn apply(&mut self, first: &X, second: &Y) -> Result<Z, E> {
        self(first, second)
    }
}

/// A single-argument computation that may fail.
pub trait Func<X> {
    type Output;
    type Error;

    fn apply(&mut self, arg: &X) -> Result<Self::Output, Self::Error>;
}

impl<X, Z, E, F> Func<X> for F
where
    F: FnMut(&X) -> Result<Z, E>,
{
    type Output = Z;
    type Error = E;

    #[inline]
    fn apply(&mut self, arg: &X) -> Result<Z, E> {
        self(arg)
    }
}

/// A zero-argument computation that may fail.
pub trait Scalar {
    type Output;
    type Error;

    fn value(&mut self) -> Result<Self::Output, Self::Error>;
}

impl<Z, E, F> Scalar for F
where
    F: FnMut() -> Result<Z, E>,
{
    type Output = Z;
    type Error = E;

    #[inline]
    fn value(&mut self) -> Result<Z, E> {
        self()
    }
}

/// A zero-argument computation producing text.
pub trait Text {
    type Error;

    fn as_string(&mut self) -> Result<String, Self::Error>;
}

impl<E, F> Text for F
where
    F: FnMut() -> Result<String, E>,
{
    type Error = E;

    #[inline]
    fn as_string(&mut self) -> Result<String, E> {
        self()
    }
}
