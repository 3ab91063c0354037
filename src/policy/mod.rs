//! Memoization engines.
//!
//! | Engine                                   | Key      | Returns  | Retention                       |
//! |------------------------------------------|----------|----------|---------------------------------|
//! | [`BoundedHitCache`](bounded_hits)        | `K`      | `V`      | fixed capacity, fewest hits out |
//! | [`ReclaimableCache`](reclaimable)        | `K`      | `Arc<V>` | until memory pressure reclaims  |
//! | [`WeakKeyStore`](weak_key)               | `Arc<K>` | `V`      | while the key is alive          |
//!
//! All three implement [`Memoizer`](crate::traits::Memoizer); the adapters in
//! [`crate::func`] work with any of them.

pub mod bounded_hits;
pub mod reclaimable;
pub mod weak_key;
