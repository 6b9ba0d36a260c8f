//! Error types for the kernelkit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when construction parameters are invalid
//!   (zero capacity, zero dimension, growing shrink target).
//! - [`AccessError`]: Returned when a mutating operation receives a key or
//!   index outside the configured domain, a row of the wrong length, or is
//!   called outside its maintenance window.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//!
//! All three are precondition failures: there is no retry path, and a caller
//! that triggers one has a bug.
//!
//! ## Example Usage
//!
//! ```
//! use kernelkit::error::{AccessError, ConfigError};
//! use kernelkit::policy::row_cache::RowCache;
//!
//! // Fallible constructor for user-configurable parameters
//! let bad: Result<RowCache<Vec<f32>>, ConfigError> = RowCache::try_new(0, 8);
//! assert!(bad.is_err());
//!
//! let mut cache: RowCache<Vec<f32>> = RowCache::new(4, 8);
//! let err = cache.put(8, vec![0.0; 8]).unwrap_err();
//! assert_eq!(err, AccessError::InvalidKey { key: 8, dimension: 8 });
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal invariants are violated.
///
/// Produced by `check_invariants` methods (e.g.
/// [`RowCache::check_invariants`](crate::policy::row_cache::RowCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
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

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when construction or resize parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`RowCache::try_new`](crate::policy::row_cache::RowCache::try_new),
/// [`RowCache::init`](crate::policy::row_cache::RowCache::init),
/// [`RowCache::shrink`](crate::policy::row_cache::RowCache::shrink) and
/// builder `try_build()` methods.
///
/// # Example
///
/// ```
/// use kernelkit::ds::BoundedTopKRetainer;
///
/// let err = BoundedTopKRetainer::<f64, usize>::try_new(0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
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
// AccessError
// ---------------------------------------------------------------------------

/// Error returned when a cache operation violates its preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The key lies outside `0..dimension`.
    InvalidKey { key: usize, dimension: usize },
    /// A renumbering index lies outside `0..dimension`.
    InvalidIndex { index: usize, dimension: usize },
    /// The row handed to `put` does not span the full key domain.
    RowLength { expected: usize, actual: usize },
    /// The operation was called outside the state it is allowed in.
    PreconditionViolation(&'static str),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::InvalidKey { key, dimension } => {
                write!(f, "key {} is outside the key domain 0..{}", key, dimension)
            },
            AccessError::InvalidIndex { index, dimension } => {
                write!(
                    f,
                    "index {} is outside the key domain 0..{}",
                    index, dimension
                )
            },
            AccessError::RowLength { expected, actual } => {
                write!(f, "row has {} coordinates, expected {}", actual, expected)
            },
            AccessError::PreconditionViolation(msg) => {
                write!(f, "precondition violated: {}", msg)
            },
        }
    }
}

impl std::error::Error for AccessError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
