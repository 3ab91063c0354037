//! Hit ledger: per-key hit counters with O(log n) loser selection.
//!
//! Tracks, for every resident key, how many times it has been requested and
//! when it arrived. The *loser* is the key with the fewest hits; among keys
//! with equal hits, the one that arrived first. That is exactly the first
//! element of an ascending-hit-count stable sort over insertion order, without
//! paying for the sort on every eviction.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           HitLedger<K>                                  │
//! │                                                                         │
//! │   ranks: FxHashMap<K, Rank>      (authoritative)                        │
//! │                                                                         │
//! │     ┌─────────┬──────┬─────────┐                                        │
//! │     │  key    │ hits │ arrival │                                        │
//! │     ├─────────┼──────┼─────────┤                                        │
//! │     │  "A"    │  2   │    0    │                                        │
//! │     │  "C"    │  1   │    2    │                                        │
//! │     └─────────┴──────┴─────────┘                                        │
//! │                                                                         │
//! │   heap: BinaryHeap<Reverse<Candidate<K>>>   (may hold stale ranks)      │
//! │                                                                         │
//! │     (1, 0, "A")  ← STALE: ranks["A"] is (2, 0)                          │
//! │     (1, 2, "C")  ← live, current loser                                  │
//! │     (2, 0, "A")  ← live                                                 │
//! │                                                                         │
//! │   arrivals: 3   (next arrival number)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A hit pushes a fresh candidate and leaves the old one in place; popping
//! skips candidates whose rank no longer matches `ranks`. Since an arrival
//! number is never reused, each rank is unique and staleness is exact. The
//! heap is compacted once it holds more than [`HitLedger::MAX_HEAP_FACTOR`]
//! candidates per live key.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Eviction rank of a resident key. Lower ranks lose first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank {
    pub hits: u64,
    pub arrival: u64,
}

#[derive(Debug, Clone)]
struct Candidate<K> {
    rank: Rank,
    key: K,
}

// Ranks are unique across the heap, so ordering by rank alone is total.
impl<K> PartialEq for Candidate<K> {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl<K> Eq for Candidate<K> {}

impl<K> PartialOrd for Candidate<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Candidate<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank)
    }
}

/// Hit counters plus a lazy min-heap over `(hits, arrival)`.
///
/// # Example
///
/// ```
/// use memokit::ds::HitLedger;
///
/// let mut ledger = HitLedger::new();
/// ledger.admit("a");
/// ledger.admit("b");
/// ledger.record_hit(&"a");
///
/// // "b" has fewer hits, so it loses.
/// let (loser, rank) = ledger.pop_loser().unwrap();
/// assert_eq!(loser, "b");
/// assert_eq!(rank.hits, 1);
/// ```
#[derive(Debug)]
pub struct HitLedger<K> {
    ranks: FxHashMap<K, Rank>,
    heap: BinaryHeap<Reverse<Candidate<K>>>,
    arrivals: u64,
}

impl<K> HitLedger<K>
where
    K: Eq + Hash + Clone,
{
    /// Heap candidates allowed per live key before a compaction.
    pub const MAX_HEAP_FACTOR: usize = 4;

    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ranks: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            heap: BinaryHeap::with_capacity(capacity),
            arrivals: 0,
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Heap length including stale candidates.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    pub fn rank_of(&self, key: &K) -> Option<Rank> {
        self.ranks.get(key).copied()
    }

    pub fn hits(&self, key: &K) -> Option<u64> {
        self.ranks.get(key).map(|rank| rank.hits)
    }

    /// Starts tracking `key` with one hit and the next arrival number.
    ///
    /// Re-admitting a tracked key resets it to a fresh arrival.
    pub fn admit(&mut self, key: K) -> Rank {
        let rank = Rank {
            hits: 1,
            arrival: self.arrivals,
        };
        self.arrivals = self.arrivals.wrapping_add(1);
        self.ranks.insert(key.clone(), rank);
        self.push(key, rank);
        rank
    }

    /// Adds one hit to `key`, returning the new count.
    pub fn record_hit(&mut self, key: &K) -> Option<u64> {
        let rank = self.ranks.get_mut(key)?;
        rank.hits = rank.hits.saturating_add(1);
        let rank = *rank;
        self.push(key.clone(), rank);
        Some(rank.hits)
    }

    /// Stops tracking `key`. Its heap candidates go stale.
    pub fn forget(&mut self, key: &K) -> Option<Rank> {
        self.ranks.remove(key)
    }

    /// Removes and returns the loser.
    pub fn pop_loser(&mut self) -> Option<(K, Rank)> {
        while let Some(Reverse(candidate)) = self.heap.pop() {
            if self.ranks.get(&candidate.key) == Some(&candidate.rank) {
                self.ranks.remove(&candidate.key);
                return Some((candidate.key, candidate.rank));
            }
        }
        None
    }

    /// Returns the current loser without removing it.
    ///
    /// Scans the authoritative ranks, so this is O(n).
    pub fn peek_loser(&self) -> Option<(&K, Rank)> {
        self.ranks
            .iter()
            .min_by_key(|(_, rank)| **rank)
            .map(|(key, rank)| (key, *rank))
    }

    /// Rebuilds the heap from `ranks`, dropping every stale candidate.
    pub fn compact(&mut self) {
        let live: Vec<Reverse<Candidate<K>>> = self
            .ranks
            .iter()
            .map(|(key, rank)| {
                Reverse(Candidate {
                    rank: *rank,
                    key: key.clone(),
                })
            })
            .collect();
        self.heap = BinaryHeap::from(live);
    }

    pub fn clear(&mut self) {
        self.ranks.clear();
        self.heap.clear();
    }

    /// Verifies that every tracked key has a live heap candidate.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let live = self
            .heap
            .iter()
            .filter(|Reverse(c)| self.ranks.get(&c.key) == Some(&c.rank))
            .count();
        if live != self.ranks.len() {
            return Err(InvariantError::new(format!(
                "hit ledger tracks {} keys but heap holds {} live candidates",
                self.ranks.len(),
                live
            )));
        }
        Ok(())
    }

    fn push(&mut self, key: K, rank: Rank) {
        self.heap.push(Reverse(Candidate { rank, key }));
        let bound = self.ranks.len().max(1).saturating_mul(Self::MAX_HEAP_FACTOR);
        if self.heap.len() > bound {
            self.compact();
        }
    }
}

impl<K> Default for HitLedger<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewest_hits_loses() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.admit("b");
        ledger.admit("c");
        ledger.record_hit(&"a");
        ledger.record_hit(&"c");

        assert_eq!(ledger.pop_loser().map(|(k, _)| k), Some("b"));
    }

    #[test]
    fn ties_go_to_earliest_arrival() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.admit("b");
        ledger.admit("c");

        assert_eq!(ledger.pop_loser().map(|(k, _)| k), Some("a"));
        assert_eq!(ledger.pop_loser().map(|(k, _)| k), Some("b"));
        assert_eq!(ledger.pop_loser().map(|(k, _)| k), Some("c"));
        assert_eq!(ledger.pop_loser(), None);
    }

    #[test]
    fn clear_forgets_keys_but_not_arrivals() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.admit("b");
        ledger.record_hit(&"a");

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.heap_len(), 0);
        assert_eq!(ledger.pop_loser(), None);

        assert_eq!(ledger.admit("a"), Rank { hits: 1, arrival: 2 });
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn hit_ties_still_respect_arrival() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.admit("b");
        // b is hit before a, but a arrived first.
        ledger.record_hit(&"b");
        ledger.record_hit(&"a");

        let (loser, rank) = ledger.pop_loser().unwrap();
        assert_eq!(loser, "a");
        assert_eq!(rank, Rank { hits: 2, arrival: 0 });
    }

    #[test]
    fn stale_candidates_are_skipped() {
        let mut ledger = HitLedger::new();
        ledger.admit(1);
        ledger.admit(2);
        ledger.record_hit(&1);
        ledger.record_hit(&1);

        assert_eq!(ledger.pop_loser(), Some((2, Rank { hits: 1, arrival: 1 })));
        assert_eq!(ledger.pop_loser(), Some((1, Rank { hits: 3, arrival: 0 })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn forget_removes_key_from_contention() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.admit("b");
        assert_eq!(ledger.forget(&"a").map(|r| r.hits), Some(1));

        assert_eq!(ledger.pop_loser().map(|(k, _)| k), Some("b"));
        assert_eq!(ledger.pop_loser(), None);
    }

    #[test]
    fn readmission_gets_a_fresh_arrival() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.admit("b");
        ledger.forget(&"a");
        ledger.admit("a");

        assert_eq!(ledger.pop_loser().map(|(k, _)| k), Some("b"));
    }

    #[test]
    fn heap_growth_is_bounded() {
        let mut ledger = HitLedger::new();
        ledger.admit("hot");
        ledger.admit("cold");
        for _ in 0..1_000 {
            ledger.record_hit(&"hot");
        }

        assert!(ledger.heap_len() <= ledger.len() * HitLedger::<&str>::MAX_HEAP_FACTOR);
        assert_eq!(ledger.hits(&"hot"), Some(1_001));
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn peek_matches_pop() {
        let mut ledger = HitLedger::new();
        for key in 0..10 {
            ledger.admit(key);
        }
        for key in 0..5 {
            ledger.record_hit(&key);
        }

        let peeked = ledger.peek_loser().map(|(k, r)| (*k, r));
        assert_eq!(peeked, ledger.pop_loser());
        assert_eq!(peeked.map(|(k, _)| k), Some(5));
    }

    #[test]
    fn compact_drops_stale_candidates() {
        let mut ledger = HitLedger::new();
        ledger.admit("a");
        ledger.record_hit(&"a");
        ledger.record_hit(&"a");
        assert!(ledger.heap_len() > ledger.len());

        ledger.compact();
        assert_eq!(ledger.heap_len(), 1);
        assert!(ledger.check_invariants().is_ok());
    }
}
