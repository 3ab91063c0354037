//! Reclamation notifications.
//!
//! When a [`ReclaimableCache`](crate::policy::reclaimable::ReclaimableCache)
//! purges an entry whose value was reclaimed, it reports the key and slot to
//! its sink exactly once.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use parking_lot::Mutex;

use super::SlotId;

/// A purged entry: the key it was stored under and the slot that emptied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reclaimed<K> {
    pub key: K,
    pub slot: SlotId,
}

/// Receives reclamation notices from a cache sweep.
pub trait ReclaimSink<K> {
    fn notify(&self, reclaimed: Reclaimed<K>);
}

/// Shared, pollable FIFO of reclamation notices.
///
/// Clones share the same queue, so one clone can be handed to a cache and
/// another kept for polling.
///
/// ```
/// use memokit::reclaim::ReclaimQueue;
///
/// let queue: ReclaimQueue<&str> = ReclaimQueue::new();
/// assert!(queue.poll().is_none());
/// assert!(queue.is_empty());
/// ```
pub struct ReclaimQueue<K> {
    inner: Arc<Mutex<VecDeque<Reclaimed<K>>>>,
}

impl<K> ReclaimQueue<K> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Removes and returns the oldest notice.
    pub fn poll(&self) -> Option<Reclaimed<K>> {
        self.inner.lock().pop_front()
    }

    /// Removes and returns every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Reclaimed<K>> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<K> Clone for ReclaimQueue<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for ReclaimQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for ReclaimQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclaimQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl<K> ReclaimSink<K> for ReclaimQueue<K> {
    fn notify(&self, reclaimed: Reclaimed<K>) {
        self.inner.lock().push_back(reclaimed);
    }
}

// A hung-up receiver just means nobody is listening any more.
impl<K> ReclaimSink<K> for Sender<Reclaimed<K>> {
    fn notify(&self, reclaimed: Reclaimed<K>) {
        let _ = self.send(reclaimed);
    }
}
