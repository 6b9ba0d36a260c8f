//! # Row Payload Trait
//!
//! [`RowCache`](crate::policy::row_cache::RowCache) stores dense rows of a
//! kernel matrix, addressed in the same id space as the cache keys. Two cache
//! operations reach *into* the payload:
//!
//! ```text
//!   swap(i, j)                          shrink(cap, new_dim)
//!   ───────────                         ────────────────────
//!   row r:  [ .. r[i] .. r[j] .. ]      row r:  [ r[0] .. r[new_dim-1] | dropped ]
//!                 ╰──── ⇄ ────╯
//!   every live row exchanges            every surviving row is cut
//!   coordinates i and j                 to the new key domain
//! ```
//!
//! The [`Row`] trait is the seam that lets the cache stay generic over the
//! payload type while still performing those two coordinate-level updates.
//!
//! ## Implementations
//!
//! | Type          | `dim`      | `swap_coords`  | `truncate_dim`   |
//! |---------------|------------|----------------|------------------|
//! | `Vec<T>`      | `len()`    | `slice::swap`  | `Vec::truncate`  |
//!
//! Custom payloads (e.g. a row plus a cached diagonal entry) implement the
//! trait directly.

/// A dense row addressed by training-point ids.
///
/// # Example
///
/// ```
/// use kernelkit::traits::Row;
///
/// let mut row = vec![1.0_f32, 2.0, 3.0, 4.0];
/// row.swap_coords(0, 3);
/// assert_eq!(row, vec![4.0, 2.0, 3.0, 1.0]);
///
/// row.truncate_dim(2);
/// assert_eq!(row.dim(), 2);
/// ```
pub trait Row {
    /// Number of coordinates held by the row.
    fn dim(&self) -> usize;

    /// Exchanges the values stored at coordinates `i` and `j`.
    ///
    /// Callers guarantee `i < dim()` and `j < dim()`.
    fn swap_coords(&mut self, i: usize, j: usize);

    /// Drops every coordinate at or beyond `dim`.
    fn truncate_dim(&mut self, dim: usize);
}

impl<T> Row for Vec<T> {
    #[inline]
    fn dim(&self) -> usize {
        self.len()
    }

    #[inline]
    fn swap_coords(&mut self, i: usize, j: usize) {
        self.swap(i, j);
    }

    #[inline]
    fn truncate_dim(&mut self, dim: usize) {
        self.truncate(dim);
    }
}
