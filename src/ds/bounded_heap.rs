//! Bounded retainer that keeps the K most extreme values of a stream.
//!
//! A solver scores every candidate once per iteration and only wants the K
//! best of them. Sorting the whole stream costs O(N log N) and O(N) memory;
//! a size-K heap whose root is the *worst* retained value decides each
//! candidate in O(log K) with O(K) memory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │              BoundedTopKRetainer  (K = 5, retains the largest)              │
//! │                                                                             │
//! │   values:   [ 3.0 │ 4.5 │ 7.0 │ 9.1 │ 5.2 ]     min-heap over values        │
//! │   indices:  [  12 │  40 │   3 │  27 │   8 ]     parallel payload            │
//! │                                                                             │
//! │                        3.0  ← root: admission threshold                     │
//! │                       /   \                                                 │
//! │                    4.5     7.0                                              │
//! │                   /   \                                                     │
//! │                9.1     5.2                                                  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Phases
//!
//! ```text
//!   Filling (len < K)                 Full (len == K)
//!   ─────────────────                 ───────────────
//!   add → append, no ordering         add(v) with v worse than root → Rejected
//!   top() = None                      add(v) otherwise → overwrite root, sift down
//!          │                          top() = Some(root)
//!          │ len reaches K                   │
//!          └──── build heap once ──────────► │
//!                                            │ clear()
//!   Filling ◄────────────────────────────────┘
//! ```
//!
//! The array is left unordered while filling and heapified once, bottom-up,
//! when it first becomes full. `len() < capacity()` therefore means "no
//! threshold yet", and [`top`](BoundedRetainer::top) reports it as `None`.
//!
//! ## Retention Direction
//!
//! | Alias                      | Keeps         | Root            | Admits when      |
//! |----------------------------|---------------|-----------------|------------------|
//! | [`BoundedTopKRetainer`]    | K largest     | min of retained | `value >= top()` |
//! | [`BoundedBottomKRetainer`] | K smallest    | max of retained | `value <= top()` |
//!
//! Equal values are admitted, displacing one of the boundary values. Which
//! one is unspecified. Values that do not compare equal to themselves (NaN)
//! are always rejected.
//!
//! ## Operations
//!
//! | Operation        | Description                          | Complexity |
//! |------------------|--------------------------------------|------------|
//! | `add` (filling)  | Append                               | O(1)       |
//! | `add` (filling→full) | Append + build heap              | O(K)       |
//! | `add` (full)     | Reject, or replace root + sift down  | O(log K)   |
//! | `top`            | Admission threshold                  | O(1)       |
//! | `values`         | Retained indices, storage order      | O(1)       |
//! | `into_sorted_vec`| Retained pairs, best first           | O(K log K) |
//!
//! ## Example Usage
//!
//! ```
//! use kernelkit::ds::{Admission, BoundedTopKRetainer};
//!
//! let mut top3: BoundedTopKRetainer = BoundedTopKRetainer::new(3);
//! for (index, score) in [5.0, 1.0, 9.0, 3.0, 7.0].into_iter().enumerate() {
//!     top3.add(score, index);
//! }
//! assert_eq!(top3.top(), Some(5.0));
//!
//! let mut kept: Vec<usize> = top3.values().to_vec();
//! kept.sort_unstable();
//! assert_eq!(kept, vec![0, 2, 4]);
//!
//! assert_eq!(top3.add(4.0, 5), Admission::Rejected);
//! ```
//!
//! ## Thread Safety
//!
//! Not thread-safe. Wrap in a mutex for concurrent access.

use std::cmp::Ordering;
use std::marker::PhantomData;

use tracing::trace;

use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::RetainerMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::RetainerMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsReset, MetricsSnapshotProvider, RetainerMetricsRecorder};

/// Direction of a [`BoundedRetainer`].
///
/// The root of the heap is the retained value that would be displaced first.
pub trait Retention {
    /// Returns `true` if `a` must sit strictly closer to the root than `b`.
    fn above<V: PartialOrd>(a: &V, b: &V) -> bool;

    /// Returns `true` if `candidate` may displace a root holding `threshold`.
    fn admits<V: PartialOrd>(candidate: &V, threshold: &V) -> bool;
}

/// Keep the largest values; the root is the minimum of the retained set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Largest;

impl Retention for Largest {
    #[inline]
    fn above<V: PartialOrd>(a: &V, b: &V) -> bool {
        a < b
    }

    #[inline]
    fn admits<V: PartialOrd>(candidate: &V, threshold: &V) -> bool {
        candidate >= threshold
    }
}

/// Keep the smallest values; the root is the maximum of the retained set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Smallest;

impl Retention for Smallest {
    #[inline]
    fn above<V: PartialOrd>(a: &V, b: &V) -> bool {
        a > b
    }

    #[inline]
    fn admits<V: PartialOrd>(candidate: &V, threshold: &V) -> bool {
        candidate <= threshold
    }
}

/// Outcome of [`BoundedRetainer::add`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission<V, I> {
    /// Stored while the retainer was still filling.
    Appended,
    /// Stored in place of the previous root, which is returned.
    Replaced { value: V, index: I },
    /// Not retained.
    Rejected,
}

/// Whether the retainer has reached its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `len() < capacity()`; storage is unordered and there is no threshold.
    Filling,
    /// `len() == capacity()`; storage is a heap and `top()` is the threshold.
    Full,
}

/// Retains the K largest `(value, index)` pairs of a stream.
pub type BoundedTopKRetainer<V = f64, I = usize> = BoundedRetainer<V, I, Largest>;

/// Retains the K smallest `(value, index)` pairs of a stream.
pub type BoundedBottomKRetainer<V = f64, I = usize> = BoundedRetainer<V, I, Smallest>;

/// Fixed-capacity heap retaining the K most extreme values seen.
///
/// `V` is the score, `I` the payload carried alongside it (typically a
/// training-point index). `R` picks the direction; see [`Largest`] and
/// [`Smallest`].
///
/// # Example
///
/// ```
/// use kernelkit::ds::BoundedBottomKRetainer;
///
/// let mut lowest: BoundedBottomKRetainer<i32, char> = BoundedBottomKRetainer::new(2);
/// lowest.extend([(4, 'a'), (-1, 'b'), (7, 'c'), (0, 'd')]);
///
/// assert_eq!(lowest.top(), Some(0));
/// assert_eq!(lowest.into_sorted_vec(), vec![(-1, 'b'), (0, 'd')]);
/// ```
#[derive(Debug, Clone)]
pub struct BoundedRetainer<V, I, R> {
    values: Vec<V>,
    indices: Vec<I>,
    capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: RetainerMetrics,
    _retention: PhantomData<R>,
}

impl<V, I, R> BoundedRetainer<V, I, R>
where
    V: PartialOrd + Copy,
    I: Copy,
    R: Retention,
{
    /// Creates a retainer for `k` pairs.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero. See [`try_new`](Self::try_new).
    pub fn new(k: usize) -> Self {
        match Self::try_new(k) {
            Ok(retainer) => retainer,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a retainer for `k` pairs, returning an error if `k` is zero.
    ///
    /// Both backing arrays are allocated here; `add` never allocates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `k` is zero.
    pub fn try_new(k: usize) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::new(
                "retainer capacity must be greater than zero",
            ));
        }
        Ok(Self {
            values: Vec::with_capacity(k),
            indices: Vec::with_capacity(k),
            capacity: k,
            #[cfg(feature = "metrics")]
            metrics: RetainerMetrics::default(),
            _retention: PhantomData,
        })
    }

    /// Offers `(value, index)` to the retainer.
    ///
    /// # Example
    ///
    /// ```
    /// use kernelkit::ds::{Admission, BoundedTopKRetainer};
    ///
    /// let mut best: BoundedTopKRetainer<u32, &str> = BoundedTopKRetainer::new(1);
    /// assert_eq!(best.add(4, "x"), Admission::Appended);
    /// assert_eq!(best.add(2, "y"), Admission::Rejected);
    /// assert_eq!(best.add(10, "z"), Admission::Replaced { value: 4, index: "x" });
    /// assert_eq!(best.values(), &["z"]);
    /// ```
    pub fn add(&mut self, value: V, index: I) -> Admission<V, I> {
        #[cfg(feature = "metrics")]
        self.metrics.record_add_call();

        if value.partial_cmp(&value).is_none() {
            #[cfg(feature = "metrics")]
            self.metrics.record_reject();
            return Admission::Rejected;
        }

        if self.values.len() < self.capacity {
            self.values.push(value);
            self.indices.push(index);
            #[cfg(feature = "metrics")]
            self.metrics.record_append();
            if self.values.len() == self.capacity {
                self.build_heap();
            }
            return Admission::Appended;
        }

        if !R::admits(&value, &self.values[0]) {
            #[cfg(feature = "metrics")]
            self.metrics.record_reject();
            return Admission::Rejected;
        }

        let displaced = Admission::Replaced {
            value: self.values[0],
            index: self.indices[0],
        };
        self.values[0] = value;
        self.indices[0] = index;
        let _steps = self.sift_down(0);
        #[cfg(feature = "metrics")]
        {
            self.metrics.record_replace();
            self.metrics.record_sift_steps(_steps);
        }
        displaced
    }

    /// Returns the admission threshold, or `None` while still filling.
    #[inline]
    pub fn top(&self) -> Option<V> {
        if self.is_full() {
            self.values.first().copied()
        } else {
            None
        }
    }

    /// Returns the retained indices in storage order.
    ///
    /// Only the set is meaningful; the order is a heap layout detail.
    #[inline]
    pub fn values(&self) -> &[I] {
        &self.indices
    }

    /// Iterates retained `(value, index)` pairs in storage order.
    pub fn entries(&self) -> impl Iterator<Item = (V, I)> + '_ {
        self.values.iter().copied().zip(self.indices.iter().copied())
    }

    /// Consumes the retainer and returns its pairs, most extreme first.
    pub fn into_sorted_vec(self) -> Vec<(V, I)> {
        let mut pairs: Vec<(V, I)> = self.values.into_iter().zip(self.indices).collect();
        pairs.sort_by(|a, b| {
            if R::above(&a.0, &b.0) {
                Ordering::Greater
            } else if R::above(&b.0, &a.0) {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        });
        pairs
    }

    /// Returns the number of retained pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns K, the most pairs the retainer keeps.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if nothing is retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` once K pairs are retained and [`top`](Self::top) is defined.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Returns the current [`Phase`].
    pub fn phase(&self) -> Phase {
        if self.is_full() {
            Phase::Full
        } else {
            Phase::Filling
        }
    }

    /// Drops every retained pair and returns to the filling phase.
    ///
    /// Keeps the allocation.
    pub fn clear(&mut self) {
        self.values.clear();
        self.indices.clear();
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }

    /// Checks storage and heap-order invariants.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.values.len() != self.indices.len() {
            return Err(InvariantError::new(format!(
                "values ({}) and indices ({}) disagree",
                self.values.len(),
                self.indices.len()
            )));
        }
        if self.values.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "len {} exceeds capacity {}",
                self.values.len(),
                self.capacity
            )));
        }
        if let Some(pos) = self.values.iter().position(|v| v.partial_cmp(v).is_none()) {
            return Err(InvariantError::new(format!(
                "incomparable value retained at {}",
                pos
            )));
        }
        if self.is_full() {
            for child in 1..self.values.len() {
                let parent = (child - 1) / 2;
                if R::above(&self.values[child], &self.values[parent]) {
                    return Err(InvariantError::new(format!(
                        "heap order broken between parent {} and child {}",
                        parent, child
                    )));
                }
            }
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

    fn build_heap(&mut self) {
        let mut _steps = 0u64;
        for pos in (0..self.values.len() / 2).rev() {
            _steps += self.sift_down(pos);
        }
        #[cfg(feature = "metrics")]
        {
            self.metrics.record_heapify();
            self.metrics.record_sift_steps(_steps);
        }
        trace!(capacity = self.capacity, "retainer full, heap built");
    }

    /// Moves the entry at `pos` down until neither child belongs above it.
    /// Returns the number of swaps.
    fn sift_down(&mut self, mut pos: usize) -> u64 {
        let len = self.values.len();
        let mut steps = 0;
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && R::above(&self.values[right], &self.values[left]) {
                child = right;
            }
            if !R::above(&self.values[child], &self.values[pos]) {
                break;
            }
            self.values.swap(pos, child);
            self.indices.swap(pos, child);
            pos = child;
            steps += 1;
        }
        steps
    }
}

impl<V, I, R> Extend<(V, I)> for BoundedRetainer<V, I, R>
where
    V: PartialOrd + Copy,
    I: Copy,
    R: Retention,
{
    fn extend<T: IntoIterator<Item = (V, I)>>(&mut self, iter: T) {
        for (value, index) in iter {
            self.add(value, index);
        }
    }
}

#[cfg(feature = "metrics")]
impl<V, I, R> MetricsSnapshotProvider<RetainerMetricsSnapshot> for BoundedRetainer<V, I, R> {
    fn snapshot(&self) -> RetainerMetricsSnapshot {
        RetainerMetricsSnapshot {
            add_calls: self.metrics.add_calls,
            appended: self.metrics.appended,
            heapify_passes: self.metrics.heapify_passes,
            replaced: self.metrics.replaced,
            rejected: self.metrics.rejected,
            sift_steps: self.metrics.sift_steps,
            clear_calls: self.metrics.clear_calls,
            len: self.values.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(feature = "metrics")]
impl<V, I, R> MetricsReset for BoundedRetainer<V, I, R> {
    fn reset_metrics(&mut self) {
        self.metrics.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retained_values<R: Retention>(r: &BoundedRetainer<f64, usize, R>) -> Vec<f64> {
        let mut v: Vec<f64> = r.entries().map(|(value, _)| value).collect();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    #[test]
    fn scenario_capacity_three() {
        let mut r: BoundedTopKRetainer<f64, char> = BoundedTopKRetainer::new(3);
        for (v, i) in [(5.0, 'a'), (1.0, 'b'), (9.0, 'c'), (3.0, 'd'), (7.0, 'e')] {
            r.add(v, i);
            r.debug_validate_invariants();
        }
        assert_eq!(r.top(), Some(5.0));
        let mut kept: Vec<char> = r.values().to_vec();
        kept.sort_unstable();
        assert_eq!(kept, vec!['a', 'c', 'e']);
    }

    #[test]
    fn scenario_capacity_one() {
        let mut r: BoundedTopKRetainer<f64, char> = BoundedTopKRetainer::new(1);
        assert_eq!(r.add(4.0, 'x'), Admission::Appended);
        assert_eq!(r.add(2.0, 'y'), Admission::Rejected);
        assert_eq!(
            r.add(10.0, 'z'),
            Admission::Replaced {
                value: 4.0,
                index: 'x'
            }
        );
        assert_eq!(r.values(), &['z']);
        assert_eq!(r.top(), Some(10.0));
    }

    #[test]
    fn top_is_none_while_filling() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(3);
        assert_eq!(r.top(), None);
        r.add(1.0, 0);
        r.add(2.0, 1);
        assert_eq!(r.top(), None);
        assert_eq!(r.phase(), Phase::Filling);
        r.add(0.5, 2);
        assert_eq!(r.phase(), Phase::Full);
        assert_eq!(r.top(), Some(0.5));
    }

    #[test]
    fn accessors_track_fill_state() {
        let mut r: BoundedBottomKRetainer = BoundedBottomKRetainer::new(2);
        assert!(r.is_empty());
        assert!(!r.is_full());
        assert_eq!(r.capacity(), 2);

        r.add(4.0, 0);
        assert_eq!(r.len(), 1);
        assert!(!r.is_empty());
        assert!(!r.is_full());

        r.add(3.0, 1);
        r.add(1.0, 2);
        assert_eq!(r.len(), 2);
        assert!(r.is_full());
        assert_eq!(r.capacity(), 2);
    }

    #[test]
    fn root_is_minimum_of_retained_set() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(4);
        for (i, v) in [8.0, 3.0, 6.0, 1.0, 9.0, 2.0, 7.0, 5.0].into_iter().enumerate() {
            r.add(v, i);
            if let Some(top) = r.top() {
                let min = retained_values(&r)[0];
                assert_eq!(top, min);
            }
        }
        assert_eq!(retained_values(&r), vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn filling_accepts_anything() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(3);
        assert_eq!(r.add(-100.0, 0), Admission::Appended);
        assert_eq!(r.add(-200.0, 1), Admission::Appended);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn below_threshold_is_rejected_and_set_unchanged() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(2);
        r.add(5.0, 0);
        r.add(6.0, 1);
        let before = retained_values(&r);
        assert_eq!(r.add(4.9, 2), Admission::Rejected);
        assert_eq!(retained_values(&r), before);
    }

    #[test]
    fn tie_with_threshold_is_admitted() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(2);
        r.add(5.0, 0);
        r.add(6.0, 1);
        assert!(matches!(r.add(5.0, 2), Admission::Replaced { value, .. } if value == 5.0));
        assert_eq!(retained_values(&r), vec![5.0, 6.0]);
        assert!(r.values().contains(&2));
    }

    #[test]
    fn nan_is_rejected_in_both_phases() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(2);
        assert_eq!(r.add(f64::NAN, 0), Admission::Rejected);
        r.add(1.0, 1);
        r.add(2.0, 2);
        assert_eq!(r.add(f64::NAN, 3), Admission::Rejected);
        r.debug_validate_invariants();
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn bottom_k_mirrors_top_k() {
        let mut r: BoundedBottomKRetainer = BoundedBottomKRetainer::new(3);
        for (i, v) in [5.0, 1.0, 9.0, 3.0, 7.0].into_iter().enumerate() {
            r.add(v, i);
            r.debug_validate_invariants();
        }
        assert_eq!(r.top(), Some(5.0));
        assert_eq!(retained_values(&r), vec![1.0, 3.0, 5.0]);
        assert_eq!(r.add(6.0, 9), Admission::Rejected);
        assert!(matches!(r.add(0.0, 10), Admission::Replaced { value, .. } if value == 5.0));
    }

    #[test]
    fn into_sorted_vec_is_best_first() {
        let mut r: BoundedTopKRetainer<i32, u8> = BoundedTopKRetainer::new(3);
        r.extend([(2, 0), (8, 1), (5, 2), (1, 3), (9, 4)]);
        assert_eq!(r.into_sorted_vec(), vec![(9, 4), (8, 1), (5, 2)]);
    }

    #[test]
    fn into_sorted_vec_while_filling() {
        let mut r: BoundedTopKRetainer<i32, u8> = BoundedTopKRetainer::new(5);
        r.extend([(2, 0), (8, 1)]);
        assert_eq!(r.into_sorted_vec(), vec![(8, 1), (2, 0)]);
    }

    #[test]
    fn clear_returns_to_filling() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(2);
        r.add(1.0, 0);
        r.add(2.0, 1);
        r.clear();
        assert!(r.is_empty());
        assert_eq!(r.phase(), Phase::Filling);
        assert_eq!(r.top(), None);
        assert_eq!(r.add(-5.0, 2), Admission::Appended);
    }

    #[test]
    fn zero_capacity_is_an_error() {
        let err = BoundedTopKRetainer::<f64, usize>::try_new(0).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn new_panics_on_zero_capacity() {
        let _ = BoundedBottomKRetainer::<f64, usize>::new(0);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn metrics_track_admissions() {
        let mut r: BoundedTopKRetainer = BoundedTopKRetainer::new(2);
        r.add(1.0, 0);
        r.add(2.0, 1);
        r.add(0.5, 2);
        r.add(3.0, 3);
        let snap = r.snapshot();
        assert_eq!(snap.add_calls, 4);
        assert_eq!(snap.appended, 2);
        assert_eq!(snap.heapify_passes, 1);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.replaced, 1);
        assert_eq!(snap.len, 2);
    }
}
