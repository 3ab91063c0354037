//! Error types for memokit.
//!
//! Compute failures are never wrapped: every memoizer returns the origin
//! function's own error type unchanged. The types here cover the two other
//! failure classes.
//!
//! - [`ConfigError`]: invalid construction parameters (negative capacity,
//!   out-of-range reclaim probability, conflicting builder settings).
//! - [`InvariantError`]: returned by `check_invariants` methods when internal
//!   bookkeeping disagrees with the backing table.
//!
//! ## Example Usage
//!
//! ```
//! use memokit::builder::MemoBuilder;
//! use memokit::error::ConfigError;
//!
//! let ok: Result<MemoBuilder, ConfigError> = MemoBuilder::new().try_capacity(16);
//! assert!(ok.is_ok());
//!
//! let err = MemoBuilder::new().try_capacity(-1).unwrap_err();
//! assert!(err.to_string().contains("capacity"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when memoizer configuration is invalid.
///
/// Produced by fallible constructors such as
/// [`MemoBuilder::try_capacity`](crate::builder::MemoBuilder::try_capacity),
/// [`MemoBuilder::try_build`](crate::builder::MemoBuilder::try_build) and
/// [`RandomReclaim::try_new`](crate::reclaim::policy::RandomReclaim::try_new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when a cache's internal bookkeeping is inconsistent.
///
/// See [`BoundedHitCache::check_invariants`](crate::policy::bounded_hits::BoundedHitCache::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}
