pub use crate::builder::{Memo, MemoBuilder, MemoPolicy};
#[cfg(feature = "concurrency")]
pub use crate::concurrent::SharedMemo;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::func::{CachedBiFunc, CachedFunc, CachedScalar, CachedText, WeakFunc};
pub use crate::key::{ArgPair, NullaryKey, Placeholder, UnaryKey};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::MemoMetricsSnapshot;
pub use crate::policy::bounded_hits::BoundedHitCache;
pub use crate::policy::reclaimable::ReclaimableCache;
pub use crate::policy::weak_key::WeakKeyStore;
pub use crate::reclaim::policy::{LeastRecentlyTouched, NeverReclaim, RandomReclaim, ReclaimAll};
pub use crate::reclaim::{MemoryPressure, ReclaimQueue, ReclaimSink, Reclaimed, SoftSlot};
pub use crate::traits::{BiFunc, Func, Memoizer, Scalar, Text};
