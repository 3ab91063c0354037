//! Cache keys for memoized functions.
//!
//! The function adapters key their memoizers by an [`ArgPair`]: the ordered pair
//! of arguments the origin function was called with. Functions of lower arity
//! fill the unused positions with [`Placeholder`], so a one-argument function
//! is keyed by `ArgPair<Placeholder, X>` and a zero-argument one by
//! [`NullaryKey`].
//!
//! Equality, hashing and ordering are structural. `ArgPair` offers no way to
//! mutate its components, so a key cannot change identity after insertion.
//!
//! ```
//! use memokit::key::{ArgPair, Placeholder};
//!
//! let a = ArgPair::new(1, "x");
//! let b = ArgPair::from((1, "x"));
//! assert_eq!(a, b);
//! assert_eq!(a.first(), &1);
//!
//! assert_eq!(ArgPair::unary(7), ArgPair::new(Placeholder, 7));
//! ```

/// Ordered pair of origin-function arguments, used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ArgPair<X, Y> {
    first: X,
    second: Y,
}

/// The fixed, shared argument that arity adapters substitute for missing
/// arguments. All placeholders are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Placeholder;

/// Key shape used by single-argument adapters.
pub type UnaryKey<X> = ArgPair<Placeholder, X>;

/// Key shape used by zero-argument adapters (scalars, texts).
pub type NullaryKey = ArgPair<Placeholder, Placeholder>;

impl<X, Y> ArgPair<X, Y> {
    #[inline]
    pub fn new(first: X, second: Y) -> Self {
        Self { first, second }
    }

    #[inline]
    pub fn first(&self) -> &X {
        &self.first
    }

    #[inline]
    pub fn second(&self) -> &Y {
        &self.second
    }

    /// Splits the pair back into its arguments.
    #[inline]
    pub fn into_parts(self) -> (X, Y) {
        (self.first, self.second)
    }
}

impl<X> ArgPair<Placeholder, X> {
    /// Key for a single-argument call.
    #[inline]
    pub fn unary(arg: X) -> Self {
        Self::new(Placeholder, arg)
    }
}

impl ArgPair<Placeholder, Placeholder> {
    /// Key for a zero-argument call. Every nullary key is equal to every other.
    #[inline]
    pub fn nullary() -> Self {
        Self::new(Placeholder, Placeholder)
    }
}

impl<X, Y> From<(X, Y)> for ArgPair<X, Y> {
    fn from((first, second): (X, Y)) -> Self {
        Self::new(first, second)
    }
}
