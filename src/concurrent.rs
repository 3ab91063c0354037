//! Thread-safe memoizer wrapper.
//!
//! Every engine mutates on a hit (hit counts, recency, sweeps), so there is
//! no read path to share: [`SharedMemo`] serializes all access behind one
//! `parking_lot::Mutex`. `compute` runs while the lock is held, so concurrent
//! callers asking for the same missing key compute it once.
//!
//! ```text
//!   SharedMemo<M>  (Clone = new handle, same table)
//!        │
//!        ▼
//!   Arc<Mutex<M>> ──► M: Memoizer<K, V>
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::traits::Memoizer;

/// Shareable handle to a memoizer.
///
/// # Example
///
/// ```
/// use std::thread;
/// use memokit::concurrent::SharedMemo;
/// use memokit::policy::bounded_hits::BoundedHitCache;
///
/// let memo = SharedMemo::new(BoundedHitCache::new(64));
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let memo = memo.clone();
///         thread::spawn(move || memo.get_or_compute(10u64, |k| Ok::<_, ()>(k * 2)))
///     })
///     .collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), Ok(20));
/// }
/// assert_eq!(memo.with(|cache| cache.hits(&10)), Some(4));
/// ```
pub struct SharedMemo<M> {
    inner: Arc<Mutex<M>>,
}

impl<M> SharedMemo<M> {
    pub fn new(memo: M) -> Self {
        Self {
            inner: Arc::new(Mutex::new(memo)),
        }
    }

    /// Looks up `key` under the lock, computing on a miss.
    pub fn get_or_compute<K, V, E, F>(&self, key: K, compute: F) -> Result<M::Output, E>
    where
        M: Memoizer<K, V>,
        F: FnOnce(&K) -> Result<V, E>,
    {
        self.inner.lock().get_or_compute(key, compute)
    }

    pub fn contains<K, V>(&self, key: &K) -> bool
    where
        M: Memoizer<K, V>,
    {
        self.inner.lock().contains(key)
    }

    pub fn len<K, V>(&self) -> usize
    where
        M: Memoizer<K, V>,
    {
        self.inner.lock().len()
    }

    /// Runs `f` with exclusive access to the wrapped memoizer.
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<M> Clone for SharedMemo<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for SharedMemo<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMemo")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}
