//! # Memory Pressure and Soft Slots
//!
//! Values stored by a [`ReclaimableCache`](crate::policy::reclaimable::ReclaimableCache)
//! are *softly reachable*: a [`MemoryPressure`] registry owns them, the cache
//! only keeps a [`SoftSlot`] (a weak handle), and callers get their own strong
//! `Arc`. When pressure is signalled the registry drops values that nobody
//! else holds, and the matching slots start reporting empty.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────────┐
//!   │ MemoryPressure  (Arc<Mutex<PressureState>>, cheap to clone)           │
//!   │                                                                       │
//!   │   held: FxHashMap<SlotId, Held>                                       │
//!   │     ┌────────┬──────────────────────────┬──────────┬────────────┐     │
//!   │     │ SlotId │ value: Arc<dyn Any>      │ admitted │ last_touch │     │
//!   │     ├────────┼──────────────────────────┼──────────┼────────────┤     │
//!   │     │   0    │ strong = 1 → candidate   │    0     │     4      │     │
//!   │     │   1    │ strong = 2 → pinned      │    1     │     1      │     │
//!   │     └────────┴──────────────────────────┴──────────┴────────────┘     │
//!   │                                                                       │
//!   │   policy: Box<dyn ReclaimPolicy>   clock: u64                         │
//!   └───────────────────────────────────────────────────────────────────────┘
//!             ▲ admit / touch / release                ▲ reclaim / reclaim_all
//!             │                                        │
//!   ┌─────────┴─────────────┐                ┌─────────┴──────────────┐
//!   │ SoftSlot<V> (Weak<V>) │                │ external memory manager│
//!   └───────────────────────┘                └────────────────────────┘
//! ```
//!
//! ## Reachability
//!
//! A held value is a *candidate* only while the registry's `Arc` is the sole
//! strong reference. Once reclaimed, no new strong reference can be made, so
//! a slot that reports [`SoftSlot::is_reclaimed`] stays reclaimed.
//!
//! Victims are dropped after the registry lock is released, so value
//! destructors may freely touch other slots.

pub mod policy;
pub mod sink;

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use self::policy::{Candidate, ReclaimAll, ReclaimPolicy, Trigger};
pub use self::sink::{ReclaimQueue, ReclaimSink, Reclaimed};

type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Identity of a value admitted to a [`MemoryPressure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

struct Held {
    value: ErasedValue,
    admitted: u64,
    last_touch: u64,
}

struct PressureState {
    held: FxHashMap<SlotId, Held>,
    next_id: u64,
    clock: u64,
    policy: Box<dyn ReclaimPolicy>,
}

impl PressureState {
    fn tick(&mut self) -> u64 {
        let now = self.clock;
        self.clock = self.clock.wrapping_add(1);
        now
    }

    fn candidates(&self) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .held
            .iter()
            .filter(|(_, held)| Arc::strong_count(&held.value) == 1)
            .map(|(&slot, held)| Candidate {
                slot,
                admitted: held.admitted,
                last_touch: held.last_touch,
            })
            .collect();
        // Deterministic order for policies that draw random numbers per candidate.
        candidates.sort_unstable_by_key(|c| c.slot);
        candidates
    }

    fn take(&mut self, victims: impl IntoIterator<Item = SlotId>) -> Vec<ErasedValue> {
        victims
            .into_iter()
            .filter_map(|slot| self.held.remove(&slot))
            .map(|held| held.value)
            .collect()
    }

    fn run_policy(&mut self, trigger: Trigger) -> Vec<ErasedValue> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Vec::new();
        }
        let held = self.held.len();
        let victims = self.policy.select(trigger, &candidates, held);
        let dropped = self.take(victims);
        if !dropped.is_empty() {
            debug!(
                ?trigger,
                candidates = candidates.len(),
                reclaimed = dropped.len(),
                held = self.held.len(),
                "memory pressure pass"
            );
        }
        dropped
    }
}

/// Shared registry of softly reachable values plus the policy that decides
/// which of them to drop.
///
/// Cloning yields another handle to the same registry; an external memory
/// manager can keep one and signal from any thread.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use memokit::reclaim::MemoryPressure;
///
/// let pressure = MemoryPressure::new();
/// let slot = pressure.admit(Arc::new(String::from("cached")));
///
/// // Still held by a caller: survives pressure.
/// let held = slot.upgrade().unwrap();
/// assert_eq!(pressure.reclaim_all(), 0);
///
/// drop(held);
/// assert_eq!(pressure.reclaim_all(), 1);
/// assert!(slot.is_reclaimed());
/// ```
#[derive(Clone)]
pub struct MemoryPressure {
    inner: Arc<Mutex<PressureState>>,
}

impl MemoryPressure {
    /// Registry whose policy drops every candidate on [`reclaim`](Self::reclaim).
    pub fn new() -> Self {
        Self::with_policy(ReclaimAll)
    }

    pub fn with_policy<P>(policy: P) -> Self
    where
        P: ReclaimPolicy + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(PressureState {
                held: FxHashMap::default(),
                next_id: 0,
                clock: 0,
                policy: Box::new(policy),
            })),
        }
    }

    /// Registers `value` and returns a weak slot for it.
    ///
    /// The registry takes the given `Arc`; keep a clone to pin the value.
    /// Runs an admission pass of the policy.
    pub fn admit<V>(&self, value: Arc<V>) -> SoftSlot<V>
    where
        V: Send + Sync + 'static,
    {
        let weak = Arc::downgrade(&value);
        let (id, dropped) = {
            let mut state = self.inner.lock();
            let id = SlotId(state.next_id);
            state.next_id = state.next_id.wrapping_add(1);
            let now = state.tick();
            state.held.insert(
                id,
                Held {
                    value,
                    admitted: now,
                    last_touch: now,
                },
            );
            (id, state.run_policy(Trigger::Admission))
        };
        drop(dropped);
        SoftSlot {
            id,
            value: weak,
            pressure: self.clone(),
        }
    }

    /// Signals memory pressure. The policy picks victims among the
    /// candidates; returns how many values were dropped.
    pub fn reclaim(&self) -> usize {
        let dropped = self.inner.lock().run_policy(Trigger::Signal);
        dropped.len()
    }

    /// Drops every softly reachable value regardless of policy.
    pub fn reclaim_all(&self) -> usize {
        let dropped = {
            let mut state = self.inner.lock();
            let victims: Vec<SlotId> = state.candidates().into_iter().map(|c| c.slot).collect();
            let dropped = state.take(victims);
            if !dropped.is_empty() {
                debug!(reclaimed = dropped.len(), held = state.held.len(), "reclaimed all candidates");
            }
            dropped
        };
        dropped.len()
    }

    /// Values currently registered, pinned or not.
    pub fn held(&self) -> usize {
        self.inner.lock().held.len()
    }

    /// Values that the next pressure pass could drop.
    pub fn softly_reachable(&self) -> usize {
        self.inner.lock().candidates().len()
    }

    fn touch(&self, id: SlotId) {
        let mut state = self.inner.lock();
        let now = state.tick();
        if let Some(held) = state.held.get_mut(&id) {
            held.last_touch = now;
        }
    }

    fn release(&self, id: SlotId) {
        let released = self.inner.lock().held.remove(&id);
        drop(released);
    }
}

impl Default for MemoryPressure {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("MemoryPressure")
            .field("held", &state.held.len())
            .field("clock", &state.clock)
            .finish_non_exhaustive()
    }
}

/// Weak handle to a value registered with a [`MemoryPressure`].
///
/// Dropping the slot unregisters the value.
pub struct SoftSlot<V> {
    id: SlotId,
    value: Weak<V>,
    pressure: MemoryPressure,
}

impl<V> SoftSlot<V> {
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Strong handle to the value, unless it has been reclaimed.
    pub fn upgrade(&self) -> Option<Arc<V>> {
        self.value.upgrade()
    }

    pub fn is_reclaimed(&self) -> bool {
        self.value.strong_count() == 0
    }

    /// Marks the value as used now, for recency-aware policies.
    pub fn touch(&self) {
        self.pressure.touch(self.id);
    }
}

impl<V> Drop for SoftSlot<V> {
    fn drop(&mut self) {
        self.pressure.release(self.id);
    }
}

impl<V> fmt::Debug for SoftSlot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftSlot")
            .field("id", &self.id)
            .field("reclaimed", &self.is_reclaimed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::policy::{LeastRecentlyTouched, NeverReclaim};
    use super::*;

    #[test]
    fn pinned_values_survive_any_pressure() {
        let pressure = MemoryPressure::new();
        let slot = pressure.admit(Arc::new(7u32));
        let pin = slot.upgrade().unwrap();

        assert_eq!(pressure.reclaim(), 0);
        assert_eq!(pressure.reclaim_all(), 0);
        assert!(!slot.is_reclaimed());
        assert_eq!(*pin, 7);
    }

    #[test]
    fn default_policy_reclaims_on_signal_only() {
        let pressure = MemoryPressure::new();
        let a = pressure.admit(Arc::new("a"));
        let b = pressure.admit(Arc::new("b"));

        assert!(!a.is_reclaimed());
        assert_eq!(pressure.softly_reachable(), 2);

        assert_eq!(pressure.reclaim(), 2);
        assert!(a.is_reclaimed());
        assert!(b.is_reclaimed());
        assert!(a.upgrade().is_none());
        assert_eq!(pressure.held(), 0);
    }

    #[test]
    fn never_reclaim_ignores_signals_but_not_reclaim_all() {
        let pressure = MemoryPressure::with_policy(NeverReclaim);
        let slot = pressure.admit(Arc::new(1u8));

        assert_eq!(pressure.reclaim(), 0);
        assert!(!slot.is_reclaimed());

        assert_eq!(pressure.reclaim_all(), 1);
        assert!(slot.is_reclaimed());
    }

    #[test]
    fn dropping_a_slot_releases_its_value() {
        let pressure = MemoryPressure::with_policy(NeverReclaim);
        let value = Arc::new(vec![1, 2, 3]);
        let slot = pressure.admit(Arc::clone(&value));
        assert_eq!(Arc::strong_count(&value), 2);

        drop(slot);
        assert_eq!(pressure.held(), 0);
        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    fn budget_policy_keeps_recently_touched_values() {
        let pressure = MemoryPressure::with_policy(LeastRecentlyTouched::new(2));
        let a = pressure.admit(Arc::new('a'));
        let b = pressure.admit(Arc::new('b'));
        a.touch();

        let c = pressure.admit(Arc::new('c'));

        assert!(b.is_reclaimed());
        assert!(!a.is_reclaimed());
        assert!(!c.is_reclaimed());
        assert_eq!(pressure.held(), 2);
    }

    #[test]
    fn clones_share_one_registry() {
        let pressure = MemoryPressure::new();
        let signaller = pressure.clone();
        let slot = pressure.admit(Arc::new(0u64));

        assert_eq!(signaller.held(), 1);
        signaller.reclaim();
        assert!(slot.is_reclaimed());
    }

    #[test]
    fn slot_ids_are_unique() {
        let pressure = MemoryPressure::with_policy(NeverReclaim);
        let a = pressure.admit(Arc::new(()));
        let b = pressure.admit(Arc::new(()));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string(), "slot#0");
    }

    #[test]
    fn pressure_can_be_signalled_from_another_thread() {
        let pressure = MemoryPressure::new();
        let slot = pressure.admit(Arc::new(String::from("x")));
        let remote = pressure.clone();

        let reclaimed = std::thread::spawn(move || remote.reclaim())
            .join()
            .unwrap();

        assert_eq!(reclaimed, 1);
        assert!(slot.is_reclaimed());
    }
}
