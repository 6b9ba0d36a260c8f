//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are separate, composable traits so the
//! data structures only ever *write* counters.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌─────────────────────────────┐
//!                 │     CoreMetricsRecorder     │
//!                 │  get_hit/get_miss/insert    │
//!                 │  evicted/clear              │
//!                 └──────────────┬──────────────┘
//!                                │
//!                                ▼
//!                 ┌─────────────────────────────┐   ┌─────────────────────────────┐
//!                 │  RowCacheMetricsRecorder    │   │ RowCacheMetricsReadRecorder │
//!                 │  renew/swap/shrink/shift    │   │ contains/peek (&self)       │
//!                 └─────────────────────────────┘   └─────────────────────────────┘
//!
//!                 ┌─────────────────────────────┐
//!                 │  RetainerMetricsRecorder    │
//!                 │  append/heapify/replace/    │
//!                 │  reject/clear               │
//!                 └─────────────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters shared by every keyed cache.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Row-cache specific counters (recency, renumbering and resizing).
pub trait RowCacheMetricsRecorder: CoreMetricsRecorder {
    fn record_invalid_slot_reuse(&mut self);
    fn record_shift_steps(&mut self, steps: u64);
    fn record_renew_call(&mut self);
    fn record_renew_found(&mut self);
    fn record_swap_call(&mut self);
    fn record_swap_moved_row(&mut self);
    fn record_swap_invalidated(&mut self);
    fn record_coordinate_swaps(&mut self, rows: u64);
    fn record_shrink(&mut self);
    fn record_init(&mut self);
}

/// Read-only row-cache metrics for `&self` methods (uses interior mutability).
pub trait RowCacheMetricsReadRecorder {
    fn record_contains_call(&self);
    fn record_contains_found(&self);
    fn record_peek_call(&self);
    fn record_peek_found(&self);
}

/// Counters for bounded top-K / bottom-K retainers.
pub trait RetainerMetricsRecorder {
    fn record_add_call(&mut self);
    fn record_append(&mut self);
    fn record_heapify(&mut self);
    fn record_replace(&mut self);
    fn record_reject(&mut self);
    fn record_sift_steps(&mut self, steps: u64);
    fn record_clear(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between training runs or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}

/// Export/publish metrics to monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
