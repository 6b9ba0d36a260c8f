//! Builder for [`RowCache`] configuration.
//!
//! ## Example
//!
//! ```rust
//! use kernelkit::builder::{RowCacheBuilder, ShrinkMode};
//! use kernelkit::policy::row_cache::RowCache;
//!
//! let mut cache: RowCache<Vec<f32>> = RowCacheBuilder::new(64, 1000)
//!     .shrink_mode(ShrinkMode::Positional)
//!     .build();
//! cache.put(3, vec![0.0; 1000]).unwrap();
//! assert!(cache.contains(3));
//! assert_eq!(cache.shrink_mode(), ShrinkMode::Positional);
//! ```

use crate::error::ConfigError;
use crate::policy::row_cache::RowCache;
use crate::traits::Row;

/// How [`RowCache::shrink`] lays out surviving entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShrinkMode {
    /// Gather live entries, keep the most recently used ones that fit, and
    /// lay them out sorted by key at the front of the new arrays.
    #[default]
    Compact,
    /// Copy slot `s` of the old arrays into slot `s` of the new arrays.
    ///
    /// Reproduces the layout older solvers produced, so trained models stay
    /// bit-for-bit comparable. Live entries stored beyond the new capacity
    /// are lost even when earlier slots are empty.
    Positional,
}

/// Builder for configuring [`RowCache`] parameters.
#[derive(Debug, Clone)]
pub struct RowCacheBuilder {
    capacity: usize,
    dimension: usize,
    shrink_mode: ShrinkMode,
}

impl RowCacheBuilder {
    /// Creates a builder for a cache of `capacity` rows over the key domain
    /// `0..dimension`.
    pub fn new(capacity: usize, dimension: usize) -> Self {
        Self {
            capacity,
            dimension,
            shrink_mode: ShrinkMode::default(),
        }
    }

    /// Sets the layout policy used by [`RowCache::shrink`].
    pub fn shrink_mode(mut self, mode: ShrinkMode) -> Self {
        self.shrink_mode = mode;
        self
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the capacity or dimension is zero. For a non-panicking
    /// alternative, use [`try_build`](Self::try_build).
    pub fn build<V: Row>(self) -> RowCache<V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the cache, returning an error on invalid parameters instead of
    /// panicking.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity or dimension is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use kernelkit::builder::RowCacheBuilder;
    /// use kernelkit::policy::row_cache::RowCache;
    ///
    /// let cache = RowCacheBuilder::new(0, 10).try_build::<Vec<f64>>();
    /// assert!(cache.is_err());
    /// ```
    pub fn try_build<V: Row>(self) -> Result<RowCache<V>, ConfigError> {
        let mut cache = RowCache::try_new(self.capacity, self.dimension)?;
        cache.set_shrink_mode(self.shrink_mode);
        Ok(cache)
    }
}
