//! Fixed-capacity LRU cache for kernel-matrix rows.
//!
//! Iterative kernel solvers request the same rows of the kernel matrix over
//! and over. `RowCache` keeps up to `capacity` of those rows, keyed by
//! training-point id, and evicts the least recently used row when a new one
//! is computed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                    RowCache<V>  (capacity = 6, dimension = 40)              │
//! │                                                                             │
//! │   slot:        0      1      2      3      4      5                         │
//! │              ┌──────┬──────┬──────┬──────┬──────┬──────┐                    │
//! │   keys:      │  2   │  7   │  9   │  31  │ MAX  │ MAX  │  non-decreasing    │
//! │              ├──────┼──────┼──────┼──────┼──────┼──────┤                    │
//! │   values:    │ row2 │ row7 │  -   │ row31│  -   │  -   │  Option<V>         │
//! │              ├──────┼──────┼──────┼──────┼──────┼──────┤                    │
//! │   last_used: │  14  │  11  │  0   │  15  │  0   │  0   │  0 = not live      │
//! │              └──────┴──────┴──────┴──────┴──────┴──────┘                    │
//! │                              ▲                 ▲                            │
//! │              invalidated by swap          never used (sentinel key)         │
//! │                                                                             │
//! │   counter: 15   (bumped on every touch)                                     │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invalidated slots keep their key, and never-used slots carry the sentinel
//! `usize::MAX`, so the whole `keys` array stays sorted and a single
//! lower-bound binary search serves every lookup.
//!
//! ## Put Flow
//!
//! ```text
//!   put(20, row20)
//!     1. pos = lower_bound(20)                 → 3   (keys[3] = 31)
//!     2. keys[pos] == 20 ?                     → no
//!     3. victim = argmin(last_used), ties last → 5   (empty, stamp 0)
//!     4. victim ≥ pos: rotate slots 3..=5 right by one
//!          keys: [2, 7, 9, _, 31, MAX]
//!     5. write (20, row20) at slot 3, stamp 16
//!          keys: [2, 7, 9, 20, 31, MAX]
//! ```
//!
//! When the victim sits left of the insertion point the rotation runs the
//! other way and the entry lands at `pos - 1`.
//!
//! ## Renumbering
//!
//! Solvers that shrink their active set renumber training points. Between
//! [`begin_renumbering`](RowCache::begin_renumbering) and
//! [`end_renumbering`](RowCache::end_renumbering) (or
//! [`shrink`](RowCache::shrink)), [`swap`](RowCache::swap) moves the row of
//! `j` under key `i`, invalidates the stale slot, and exchanges coordinates
//! `i` and `j` in every live row. It is **not** a symmetric exchange of two
//! live entries: the old row of `i` is dropped.
//!
//! ## Operations
//!
//! | Operation   | Description                              | Complexity        |
//! |-------------|------------------------------------------|-------------------|
//! | `get`       | Lookup, bump recency on hit              | O(log C)          |
//! | `peek`      | Lookup without recency change            | O(log C)          |
//! | `contains`  | Liveness test                            | O(log C)          |
//! | `renew`     | Bump recency without returning the row   | O(log C)          |
//! | `put`       | Insert, evicting the LRU slot            | O(log C) + O(C)   |
//! | `swap`      | Renumber two ids                         | O(log C) + O(C)   |
//! | `shrink`    | Rebuild with new capacity and dimension  | O(C log C)        |
//!
//! ## Allocation
//!
//! Backing storage is allocated by `new`/`init`/`shrink` only. `put` returns
//! the evicted row so the caller can recycle its buffer for the next miss.
//!
//! ## Thread Safety
//!
//! `RowCache` is not thread-safe. Wrap in a mutex for concurrent access.
//!
//! ## Example Usage
//!
//! ```
//! use kernelkit::policy::row_cache::RowCache;
//!
//! let mut cache: RowCache<Vec<f64>> = RowCache::new(2, 10);
//! cache.put(5, vec![0.5; 10]).unwrap();
//! cache.put(7, vec![0.7; 10]).unwrap();
//! assert!(cache.get(5).is_some());
//!
//! // 7 is now the least recently used row
//! let evicted = cache.put(9, vec![0.9; 10]).unwrap();
//! assert_eq!(evicted.map(|(key, _)| key), Some(7));
//! assert_eq!(cache.live_keys().collect::<Vec<_>>(), vec![5, 9]);
//! ```

use tracing::{debug, trace};

use crate::builder::{RowCacheBuilder, ShrinkMode};
use crate::error::{AccessError, ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::RowCacheMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::RowCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsReset, MetricsSnapshotProvider, RowCacheMetricsReadRecorder,
    RowCacheMetricsRecorder,
};
use crate::traits::Row;

/// Key stored in slots that have never held an entry. Sorts after every real key.
const EMPTY_KEY: usize = usize::MAX;

/// Recency stamp of a slot that holds no live entry.
const NOT_LIVE: u64 = 0;

/// Fixed-capacity, key-sorted LRU cache of kernel rows.
///
/// Keys are training-point ids in `0..dimension`; every cached row spans the
/// same id space (`row.dim() == dimension`).
///
/// # Example
///
/// ```
/// use kernelkit::policy::row_cache::RowCache;
///
/// let mut cache: RowCache<Vec<f32>> = RowCache::new(8, 4);
/// assert!(cache.get(1).is_none());
///
/// cache.put(1, vec![1.0, 0.5, 0.25, 0.0]).unwrap();
/// assert_eq!(cache.get(1), Some(&vec![1.0, 0.5, 0.25, 0.0]));
/// assert!(cache.contains(1));
/// assert!(!cache.contains(2));
/// ```
#[derive(Debug)]
pub struct RowCache<V> {
    keys: Vec<usize>,
    values: Vec<Option<V>>,
    last_used: Vec<u64>,
    counter: u64,
    len: usize,
    dimension: usize,
    shrink_mode: ShrinkMode,
    renumbering: bool,
    #[cfg(feature = "metrics")]
    metrics: RowCacheMetrics,
}

impl<V> RowCache<V>
where
    V: Row,
{
    /// Creates a cache of `capacity` rows over the key domain `0..dimension`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `dimension` is zero. See
    /// [`try_new`](Self::try_new).
    pub fn new(capacity: usize, dimension: usize) -> Self {
        match Self::try_new(capacity, dimension) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a cache, returning an error on invalid parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` or `dimension` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use kernelkit::policy::row_cache::RowCache;
    ///
    /// assert!(RowCache::<Vec<f64>>::try_new(16, 100).is_ok());
    /// assert!(RowCache::<Vec<f64>>::try_new(0, 100).is_err());
    /// assert!(RowCache::<Vec<f64>>::try_new(16, 0).is_err());
    /// ```
    pub fn try_new(capacity: usize, dimension: usize) -> Result<Self, ConfigError> {
        validate_capacity(capacity)?;
        validate_dimension(dimension)?;
        Ok(Self {
            keys: vec![EMPTY_KEY; capacity],
            values: std::iter::repeat_with(|| None).take(capacity).collect(),
            last_used: vec![NOT_LIVE; capacity],
            counter: 0,
            len: 0,
            dimension,
            shrink_mode: ShrinkMode::default(),
            renumbering: false,
            #[cfg(feature = "metrics")]
            metrics: RowCacheMetrics::default(),
        })
    }

    /// Returns a builder for configuring cache parameters.
    pub fn builder(capacity: usize, dimension: usize) -> RowCacheBuilder {
        RowCacheBuilder::new(capacity, dimension)
    }

    /// Returns the number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Returns the number of live rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no row is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the size of the key domain; valid keys are `0..dimension`.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the layout policy used by [`shrink`](Self::shrink).
    #[inline]
    pub fn shrink_mode(&self) -> ShrinkMode {
        self.shrink_mode
    }

    /// Sets the layout policy used by [`shrink`](Self::shrink).
    pub fn set_shrink_mode(&mut self, mode: ShrinkMode) {
        self.shrink_mode = mode;
    }

    /// Returns `true` between [`begin_renumbering`](Self::begin_renumbering)
    /// and the end of the window.
    #[inline]
    pub fn is_renumbering(&self) -> bool {
        self.renumbering
    }

    /// Returns the row for `key` and marks it most recently used.
    ///
    /// Keys outside the domain are misses. A miss has no side effects.
    pub fn get(&mut self, key: usize) -> Option<&V> {
        match self.find(key) {
            Some(slot) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_hit();
                self.touch(slot);
                self.values[slot].as_ref()
            },
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                None
            },
        }
    }

    /// Mutable variant of [`get`](Self::get); also bumps recency on a hit.
    ///
    /// The row must keep `dimension()` coordinates. [`swap`](Self::swap) and
    /// [`shrink`](Self::shrink) reject a cache holding a resized row.
    pub fn get_mut(&mut self, key: usize) -> Option<&mut V> {
        match self.find(key) {
            Some(slot) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_hit();
                self.touch(slot);
                self.values[slot].as_mut()
            },
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                None
            },
        }
    }

    /// Returns the row for `key` without changing its recency.
    pub fn peek(&self, key: usize) -> Option<&V> {
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_call();
        let slot = self.find(key)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_found();
        self.values[slot].as_ref()
    }

    /// Returns `true` if `key` is live. Does not change recency.
    pub fn contains(&self, key: usize) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_contains_call();
        let found = self.find(key).is_some();
        #[cfg(feature = "metrics")]
        if found {
            self.metrics.record_contains_found();
        }
        found
    }

    /// Marks `key` most recently used without returning its row.
    ///
    /// Returns `false` if `key` is not live.
    pub fn renew(&mut self, key: usize) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_renew_call();
        match self.find(key) {
            Some(slot) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_renew_found();
                self.touch(slot);
                true
            },
            None => false,
        }
    }

    /// Returns the key of the least recently used live row.
    pub fn peek_lru(&self) -> Option<usize> {
        self.last_used
            .iter()
            .enumerate()
            .filter(|&(_, &stamp)| stamp != NOT_LIVE)
            .min_by_key(|&(_, &stamp)| stamp)
            .map(|(slot, _)| self.keys[slot])
    }

    /// Inserts the row for `key`.
    ///
    /// Returns the entry that left the cache, if any: the previous row of
    /// `key` when it was already live, or the evicted least recently used
    /// row. Reusing an empty or invalidated slot returns `None`.
    ///
    /// # Errors
    ///
    /// - [`AccessError::InvalidKey`] if `key >= dimension()`.
    /// - [`AccessError::RowLength`] if `value.dim() != dimension()`.
    ///
    /// # Example
    ///
    /// ```
    /// use kernelkit::policy::row_cache::RowCache;
    ///
    /// let mut cache: RowCache<Vec<u8>> = RowCache::new(1, 2);
    /// assert_eq!(cache.put(0, vec![1, 2]).unwrap(), None);
    ///
    /// // Capacity 1: the next miss evicts key 0 and hands its buffer back
    /// let (key, mut buffer) = cache.put(1, vec![3, 4]).unwrap().unwrap();
    /// assert_eq!((key, buffer.as_slice()), (0, &[1, 2][..]));
    ///
    /// buffer.copy_from_slice(&[5, 6]);
    /// cache.put(0, buffer).unwrap();
    /// assert_eq!(cache.peek(0), Some(&vec![5, 6]));
    /// ```
    pub fn put(&mut self, key: usize, value: V) -> Result<Option<(usize, V)>, AccessError> {
        if key >= self.dimension {
            return Err(AccessError::InvalidKey {
                key,
                dimension: self.dimension,
            });
        }
        let actual = value.dim();
        if actual != self.dimension {
            return Err(AccessError::RowLength {
                expected: self.dimension,
                actual,
            });
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_call();

        let pos = self.lower_bound(key);
        if pos < self.capacity() && self.keys[pos] == key {
            if self.last_used[pos] != NOT_LIVE {
                #[cfg(feature = "metrics")]
                self.metrics.record_insert_update();
                let previous = self.values[pos].replace(value);
                self.touch(pos);
                return Ok(previous.map(|row| (key, row)));
            }
            #[cfg(feature = "metrics")]
            {
                self.metrics.record_insert_new();
                self.metrics.record_invalid_slot_reuse();
            }
            self.values[pos] = Some(value);
            self.touch(pos);
            self.len += 1;
            return Ok(None);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        let victim = self.lru_slot();
        let evicted = if self.last_used[victim] != NOT_LIVE {
            self.len -= 1;
            self.values[victim].take().map(|row| (self.keys[victim], row))
        } else {
            self.values[victim] = None;
            None
        };

        let slot = if victim < pos {
            self.rotate_left(victim..pos);
            pos - 1
        } else {
            self.rotate_right(pos..victim + 1);
            pos
        };
        #[cfg(feature = "metrics")]
        self.metrics
            .record_shift_steps(victim.abs_diff(slot) as u64);

        self.keys[slot] = key;
        self.values[slot] = Some(value);
        self.touch(slot);
        self.len += 1;

        if let Some((evicted_key, _)) = &evicted {
            #[cfg(feature = "metrics")]
            self.metrics.record_evicted_entry();
            trace!(evicted = *evicted_key, inserted = key, "row evicted");
        }
        Ok(evicted)
    }

    /// Opens the renumbering window in which [`swap`](Self::swap) is allowed.
    pub fn begin_renumbering(&mut self) {
        if !self.renumbering {
            debug!(live = self.len, "row cache renumbering started");
        }
        self.renumbering = true;
    }

    /// Closes the renumbering window.
    pub fn end_renumbering(&mut self) {
        if self.renumbering {
            debug!(live = self.len, "row cache renumbering finished");
        }
        self.renumbering = false;
    }

    /// Renames training points `i` and `j` across the whole cache.
    ///
    /// - If both are live, the row stored under `j` moves into the slot of
    ///   `i` (keeping its recency) and the slot of `j` is invalidated. The
    ///   previous row of `i` is dropped.
    /// - If only one is live, that entry is invalidated.
    /// - Afterwards every live row exchanges coordinates `i` and `j`.
    ///
    /// LRU ordering is not preserved across a renumbering pass.
    ///
    /// # Errors
    ///
    /// - [`AccessError::PreconditionViolation`] outside the renumbering window.
    /// - [`AccessError::InvalidIndex`] if `i` or `j` is `>= dimension()`.
    /// - [`AccessError::RowLength`] if a live row was resized through
    ///   [`get_mut`](Self::get_mut). Nothing is changed.
    ///
    /// # Example
    ///
    /// ```
    /// use kernelkit::policy::row_cache::RowCache;
    ///
    /// let mut cache: RowCache<Vec<u32>> = RowCache::new(4, 3);
    /// cache.put(0, vec![0, 1, 2]).unwrap();
    /// cache.put(2, vec![20, 21, 22]).unwrap();
    ///
    /// assert!(cache.swap(0, 2).is_err());
    ///
    /// cache.begin_renumbering();
    /// cache.swap(0, 2).unwrap();
    /// cache.end_renumbering();
    ///
    /// // Row of 2 now lives under 0, with coordinates 0 and 2 exchanged
    /// assert_eq!(cache.peek(0), Some(&vec![22, 21, 20]));
    /// assert!(!cache.contains(2));
    /// ```
    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), AccessError> {
        if !self.renumbering {
            return Err(AccessError::PreconditionViolation(
                "swap is only allowed inside a renumbering window",
            ));
        }
        for index in [i, j] {
            if index >= self.dimension {
                return Err(AccessError::InvalidIndex {
                    index,
                    dimension: self.dimension,
                });
            }
        }
        if let Some((_, actual)) = self.mismatched_row() {
            return Err(AccessError::RowLength {
                expected: self.dimension,
                actual,
            });
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_swap_call();
        if i == j {
            return Ok(());
        }

        match (self.find(i), self.find(j)) {
            (Some(slot_i), Some(slot_j)) => {
                self.values[slot_i] = self.values[slot_j].take();
                self.last_used[slot_i] = self.last_used[slot_j];
                self.last_used[slot_j] = NOT_LIVE;
                self.len -= 1;
                #[cfg(feature = "metrics")]
                self.metrics.record_swap_moved_row();
            },
            (Some(slot), None) | (None, Some(slot)) => {
                self.invalidate(slot);
                #[cfg(feature = "metrics")]
                self.metrics.record_swap_invalidated();
            },
            (None, None) => {},
        }

        let mut rows = 0u64;
        for row in self.values.iter_mut().flatten() {
            row.swap_coords(i, j);
            rows += 1;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_coordinate_swaps(rows);
        trace!(i, j, rows, "row cache ids swapped");
        Ok(())
    }

    /// Resets the cache to `capacity` empty slots.
    ///
    /// Keeps the dimension and shrink mode; resets the recency counter and
    /// closes any renumbering window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` is zero; the cache is unchanged.
    pub fn init(&mut self, capacity: usize) -> Result<(), ConfigError> {
        validate_capacity(capacity)?;
        self.keys.clear();
        self.keys.resize(capacity, EMPTY_KEY);
        self.values.clear();
        self.values.resize_with(capacity, || None);
        self.last_used.clear();
        self.last_used.resize(capacity, NOT_LIVE);
        self.counter = 0;
        self.len = 0;
        self.renumbering = false;
        #[cfg(feature = "metrics")]
        self.metrics.record_init();
        debug!(capacity, dimension = self.dimension, "row cache initialised");
        Ok(())
    }

    /// Empties every slot while keeping the capacity.
    ///
    /// Like [`init`](Self::init), closes any renumbering window.
    pub fn clear(&mut self) {
        self.keys.fill(EMPTY_KEY);
        self.values.iter_mut().for_each(|value| *value = None);
        self.last_used.fill(NOT_LIVE);
        self.counter = 0;
        self.len = 0;
        self.renumbering = false;
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }

    /// Rebuilds the cache with `new_capacity` slots over the smaller key
    /// domain `0..new_dimension`.
    ///
    /// Every surviving row is truncated to `new_dimension` coordinates and
    /// rows keyed outside the new domain are dropped. Layout follows
    /// [`shrink_mode`](Self::shrink_mode); recency stamps survive in both
    /// modes. Closes the renumbering window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `new_capacity` or `new_dimension` is zero,
    /// if `new_dimension` exceeds the current dimension, or if a live row was
    /// resized through [`get_mut`](Self::get_mut). The cache is unchanged on
    /// error.
    ///
    /// # Example
    ///
    /// ```
    /// use kernelkit::policy::row_cache::RowCache;
    ///
    /// let mut cache: RowCache<Vec<u16>> = RowCache::new(4, 4);
    /// cache.put(1, vec![10, 11, 12, 13]).unwrap();
    /// cache.put(3, vec![30, 31, 32, 33]).unwrap();
    ///
    /// cache.shrink(2, 2).unwrap();
    /// assert_eq!(cache.peek(1), Some(&vec![10, 11]));
    /// assert!(!cache.contains(3));
    /// ```
    pub fn shrink(&mut self, new_capacity: usize, new_dimension: usize) -> Result<(), ConfigError> {
        validate_capacity(new_capacity)?;
        validate_dimension(new_dimension)?;
        if new_dimension > self.dimension {
            return Err(ConfigError::new(format!(
                "shrink cannot grow the dimension from {} to {}",
                self.dimension, new_dimension
            )));
        }
        if let Some((key, actual)) = self.mismatched_row() {
            return Err(ConfigError::new(format!(
                "row {} has {} coordinates, expected {}",
                key, actual, self.dimension
            )));
        }

        let old_len = self.len;
        match self.shrink_mode {
            ShrinkMode::Compact => self.shrink_compact(new_capacity, new_dimension),
            ShrinkMode::Positional => self.shrink_positional(new_capacity, new_dimension),
        }
        self.dimension = new_dimension;
        self.len = self.last_used.iter().filter(|&&s| s != NOT_LIVE).count();
        self.renumbering = false;

        #[cfg(feature = "metrics")]
        self.metrics.record_shrink();
        debug!(
            capacity = new_capacity,
            dimension = new_dimension,
            mode = ?self.shrink_mode,
            kept = self.len,
            dropped = old_len - self.len,
            "row cache shrunk"
        );
        Ok(())
    }

    /// Iterates live keys in ascending order.
    pub fn live_keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys
            .iter()
            .zip(&self.last_used)
            .filter(|&(_, &stamp)| stamp != NOT_LIVE)
            .map(|(&key, _)| key)
    }

    /// Iterates live `(key, row)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> + '_ {
        self.keys
            .iter()
            .zip(&self.values)
            .filter_map(|(&key, value)| value.as_ref().map(|row| (key, row)))
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let capacity = self.keys.len();
        if self.values.len() != capacity || self.last_used.len() != capacity {
            return Err(InvariantError::new(format!(
                "parallel arrays disagree: keys={} values={} last_used={}",
                capacity,
                self.values.len(),
                self.last_used.len()
            )));
        }

        let mut live = 0;
        let mut previous: Option<usize> = None;
        for slot in 0..capacity {
            let key = self.keys[slot];
            let stamp = self.last_used[slot];
            let is_live = stamp != NOT_LIVE;

            if is_live != self.values[slot].is_some() {
                return Err(InvariantError::new(format!(
                    "slot {} has stamp {} but value present = {}",
                    slot,
                    stamp,
                    self.values[slot].is_some()
                )));
            }
            if stamp > self.counter {
                return Err(InvariantError::new(format!(
                    "slot {} stamp {} exceeds counter {}",
                    slot, stamp, self.counter
                )));
            }
            if let Some(prev) = previous
                && (key < prev || (key == prev && key != EMPTY_KEY))
            {
                return Err(InvariantError::new(format!(
                    "keys out of order at slot {}: {} after {}",
                    slot, key, prev
                )));
            }
            previous = Some(key);

            if is_live {
                live += 1;
                if key >= self.dimension {
                    return Err(InvariantError::new(format!(
                        "live key {} outside domain 0..{}",
                        key, self.dimension
                    )));
                }
                if let Some(row) = &self.values[slot]
                    && row.dim() != self.dimension
                {
                    return Err(InvariantError::new(format!(
                        "row {} has {} coordinates, expected {}",
                        key,
                        row.dim(),
                        self.dimension
                    )));
                }
            }
        }

        if live != self.len {
            return Err(InvariantError::new(format!(
                "len {} but {} live slots",
                self.len, live
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates internal invariants (debug/test builds only).
    pub fn debug_validate_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            panic!("{}", e);
        }
    }

    #[cfg(any(test, debug_assertions))]
    /// Returns `(key, last_used)` for every slot, in slot order.
    pub fn debug_snapshot_slots(&self) -> Vec<(usize, u64)> {
        self.keys
            .iter()
            .copied()
            .zip(self.last_used.iter().copied())
            .collect()
    }

    /// First slot whose key is `>= key`, in `0..=capacity`.
    #[inline]
    fn lower_bound(&self, key: usize) -> usize {
        self.keys.partition_point(|&k| k < key)
    }

    #[inline]
    fn find(&self, key: usize) -> Option<usize> {
        let pos = self.lower_bound(key);
        (pos < self.keys.len() && self.keys[pos] == key && self.last_used[pos] != NOT_LIVE)
            .then_some(pos)
    }

    #[inline]
    fn touch(&mut self, slot: usize) {
        self.counter += 1;
        self.last_used[slot] = self.counter;
    }

    /// First live row whose length is not `dimension`, as `(key, length)`.
    fn mismatched_row(&self) -> Option<(usize, usize)> {
        self.keys
            .iter()
            .zip(&self.values)
            .find_map(|(&key, value)| {
                value
                    .as_ref()
                    .filter(|row| row.dim() != self.dimension)
                    .map(|row| (key, row.dim()))
            })
    }

    fn invalidate(&mut self, slot: usize) {
        self.last_used[slot] = NOT_LIVE;
        self.values[slot] = None;
        self.len -= 1;
    }

    /// Slot with the smallest stamp; ties go to the last such slot so empty
    /// tail slots are consumed before anything else.
    fn lru_slot(&self) -> usize {
        let mut victim = 0;
        let mut oldest = u64::MAX;
        for (slot, &stamp) in self.last_used.iter().enumerate() {
            if stamp <= oldest {
                oldest = stamp;
                victim = slot;
            }
        }
        victim
    }

    fn rotate_left(&mut self, range: std::ops::Range<usize>) {
        self.keys[range.clone()].rotate_left(1);
        self.values[range.clone()].rotate_left(1);
        self.last_used[range].rotate_left(1);
    }

    fn rotate_right(&mut self, range: std::ops::Range<usize>) {
        self.keys[range.clone()].rotate_right(1);
        self.values[range.clone()].rotate_right(1);
        self.last_used[range].rotate_right(1);
    }

    fn shrink_compact(&mut self, new_capacity: usize, new_dimension: usize) {
        let mut live: Vec<(usize, u64, V)> = Vec::with_capacity(self.len);
        for slot in 0..self.keys.len() {
            let key = self.keys[slot];
            if let Some(row) = self.values[slot].take()
                && key < new_dimension
            {
                live.push((key, self.last_used[slot], row));
            }
        }
        if live.len() > new_capacity {
            live.sort_unstable_by(|a, b| b.1.cmp(&a.1));
            live.truncate(new_capacity);
        }
        live.sort_unstable_by_key(|&(key, _, _)| key);

        let mut keys = vec![EMPTY_KEY; new_capacity];
        let mut values: Vec<Option<V>> = std::iter::repeat_with(|| None)
            .take(new_capacity)
            .collect();
        let mut last_used = vec![NOT_LIVE; new_capacity];
        for (slot, (key, stamp, mut row)) in live.into_iter().enumerate() {
            row.truncate_dim(new_dimension);
            keys[slot] = key;
            last_used[slot] = stamp;
            values[slot] = Some(row);
        }

        self.keys = keys;
        self.values = values;
        self.last_used = last_used;
    }

    fn shrink_positional(&mut self, new_capacity: usize, new_dimension: usize) {
        let mut keys = vec![EMPTY_KEY; new_capacity];
        let mut values: Vec<Option<V>> = std::iter::repeat_with(|| None)
            .take(new_capacity)
            .collect();
        let mut last_used = vec![NOT_LIVE; new_capacity];

        let kept = self.keys.len().min(new_capacity);
        for slot in 0..kept {
            keys[slot] = self.keys[slot];
            if let Some(mut row) = self.values[slot].take()
                && self.keys[slot] < new_dimension
            {
                row.truncate_dim(new_dimension);
                values[slot] = Some(row);
                last_used[slot] = self.last_used[slot];
            }
        }

        self.keys = keys;
        self.values = values;
        self.last_used = last_used;
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<RowCacheMetricsSnapshot> for RowCache<V> {
    fn snapshot(&self) -> RowCacheMetricsSnapshot {
        RowCacheMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            insert_calls: self.metrics.insert_calls,
            insert_new: self.metrics.insert_new,
            insert_updates: self.metrics.insert_updates,
            invalid_slot_reuses: self.metrics.invalid_slot_reuses,
            evicted_entries: self.metrics.evicted_entries,
            shift_steps: self.metrics.shift_steps,
            renew_calls: self.metrics.renew_calls,
            renew_found: self.metrics.renew_found,
            contains_calls: self.metrics.contains_calls.get(),
            contains_found: self.metrics.contains_found.get(),
            peek_calls: self.metrics.peek_calls.get(),
            peek_found: self.metrics.peek_found.get(),
            swap_calls: self.metrics.swap_calls,
            swap_moved_rows: self.metrics.swap_moved_rows,
            swap_invalidated: self.metrics.swap_invalidated,
            coordinate_swaps: self.metrics.coordinate_swaps,
            shrink_calls: self.metrics.shrink_calls,
            init_calls: self.metrics.init_calls,
            clear_calls: self.metrics.clear_calls,
            cache_len: self.len,
            capacity: self.keys.len(),
            dimension: self.dimension,
        }
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsReset for RowCache<V> {
    fn reset_metrics(&mut self) {
        self.metrics.reset_metrics();
    }
}

fn validate_capacity(capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::new("row cache capacity must be greater than zero"));
    }
    Ok(())
}

fn validate_dimension(dimension: usize) -> Result<(), ConfigError> {
    if dimension == 0 {
        return Err(ConfigError::new("row cache dimension must be greater than zero"));
    }
    Ok(())
}
