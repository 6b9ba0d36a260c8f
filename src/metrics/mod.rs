//! Operation counters for [`RowCache`](crate::policy::row_cache::RowCache)
//! and [`BoundedRetainer`](crate::ds::BoundedRetainer).
//!
//! Compiled only with the `metrics` feature. Recording is split from
//! snapshotting and exporting; see [`traits`] for the hierarchy.

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
