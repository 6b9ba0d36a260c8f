use std::cell::Cell;

/// A metrics-only counter cell for `&self` recording paths.
///
/// Lookups such as `contains` and `peek` take `&self`, so their counters
/// need interior mutability. `Cell` keeps the owning structure `!Sync`, which
/// matches the single-threaded contract of every type in this crate.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(Cell<u64>);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(Cell::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub fn incr(&self) {
        self.0.set(self.0.get() + 1);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.set(0);
    }
}
