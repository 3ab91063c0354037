//! memokit: memoization engines for functions of up to two arguments.
//!
//! - [`policy::bounded_hits`]: fixed capacity, evicts the least-hit entry.
//! - [`policy::reclaimable`]: values drop under [`reclaim::MemoryPressure`].
//! - [`policy::weak_key`]: entries live as long as their `Arc` key.
//! - [`func`]: adapters that turn any memoizer plus an origin computation
//!   back into a computation of the same shape.
//!
//! ```
//! use memokit::prelude::*;
//!
//! let mut add = CachedBiFunc::bounded(|a: &u64, b: &u64| Ok::<_, ()>(a + b), 128);
//! assert_eq!(add.apply(&3, &5), Ok(8));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod func;
pub mod key;
pub mod policy;
pub mod reclaim;
pub mod traits;

#[cfg(feature = "concurrency")]
pub mod concurrent;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
