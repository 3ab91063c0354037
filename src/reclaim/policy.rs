//! Reclaim policies: which softly reachable values a pressure pass drops.
//!
//! A [`MemoryPressure`](super::MemoryPressure) asks its policy for victims in
//! two situations, reported as a [`Trigger`]:
//!
//! - `Admission`: a value was just admitted (lets budget policies act eagerly).
//! - `Signal`: an external memory manager called
//!   [`reclaim`](super::MemoryPressure::reclaim).
//!
//! Policies only ever see values nobody else holds; a value a caller still
//! owns is never offered.
//!
//! | Policy                    | Admission        | Signal                  |
//! |---------------------------|------------------|-------------------------|
//! | [`NeverReclaim`]          | nothing          | nothing                 |
//! | [`ReclaimAll`]            | nothing          | every candidate         |
//! | [`LeastRecentlyTouched`]  | down to budget   | down to budget          |
//! | [`RandomReclaim`]         | nothing          | each with probability p |

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::SlotId;
use crate::error::ConfigError;

/// Why a pressure pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Admission,
    Signal,
}

/// A reclaimable value as seen by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub slot: SlotId,
    /// Logical time the value was admitted.
    pub admitted: u64,
    /// Logical time of the last touch; equals `admitted` if never touched.
    pub last_touch: u64,
}

/// Chooses victims among softly reachable values.
///
/// `held` is the total number of values registered with the pressure handle,
/// including ones that are currently strongly held elsewhere.
pub trait ReclaimPolicy: Send {
    fn select(&mut self, trigger: Trigger, candidates: &[Candidate], held: usize) -> Vec<SlotId>;
}

/// Keeps everything. Values live until the cache drops them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverReclaim;

impl ReclaimPolicy for NeverReclaim {
    fn select(&mut self, _: Trigger, _: &[Candidate], _: usize) -> Vec<SlotId> {
        Vec::new()
    }
}

/// Drops every softly reachable value when signalled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReclaimAll;

impl ReclaimPolicy for ReclaimAll {
    fn select(&mut self, trigger: Trigger, candidates: &[Candidate], _: usize) -> Vec<SlotId> {
        match trigger {
            Trigger::Admission => Vec::new(),
            Trigger::Signal => candidates.iter().map(|c| c.slot).collect(),
        }
    }
}

/// Keeps at most `budget` held values, dropping the least recently touched
/// softly reachable ones first.
///
/// Runs on both triggers, so a cache backed by this policy never holds more
/// than `budget` unreferenced values after an insert.
#[derive(Debug, Clone, Copy)]
pub struct LeastRecentlyTouched {
    budget: usize,
}

impl LeastRecentlyTouched {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }
}

impl ReclaimPolicy for LeastRecentlyTouched {
    fn select(&mut self, _: Trigger, candidates: &[Candidate], held: usize) -> Vec<SlotId> {
        let excess = held.saturating_sub(self.budget);
        if excess == 0 {
            return Vec::new();
        }
        let mut ordered: Vec<&Candidate> = candidates.iter().collect();
        ordered.sort_unstable_by_key(|c| (c.last_touch, c.admitted));
        ordered.into_iter().take(excess).map(|c| c.slot).collect()
    }
}

/// Drops each softly reachable value with a fixed probability when signalled.
///
/// Seeded, so a given sequence of signals is reproducible.
#[derive(Debug, Clone)]
pub struct RandomReclaim {
    probability: f64,
    rng: SmallRng,
}

impl RandomReclaim {
    /// Creates the policy, rejecting probabilities outside `[0, 1]` (and NaN).
    ///
    /// ```
    /// use memokit::reclaim::policy::RandomReclaim;
    ///
    /// assert!(RandomReclaim::try_new(0.25, 7).is_ok());
    /// assert!(RandomReclaim::try_new(1.5, 7).is_err());
    /// ```
    pub fn try_new(probability: f64, seed: u64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::new(format!(
                "reclaim probability must be within [0, 1], got {probability}"
            )));
        }
        Ok(Self {
            probability,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl ReclaimPolicy for RandomReclaim {
    fn select(&mut self, trigger: Trigger, candidates: &[Candidate], _: usize) -> Vec<SlotId> {
        if trigger == Trigger::Admission {
            return Vec::new();
        }
        candidates
            .iter()
            .filter(|_| self.rng.random_bool(self.probability))
            .map(|c| c.slot)
            .collect()
    }
}
