//! kernelkit: the in-memory structures an iterative kernel-method solver
//! leans on between kernel evaluations.
//!
//! - [`RowCache`](policy::row_cache::RowCache): fixed-capacity LRU cache of
//!   kernel-matrix rows with key renumbering and shrinking.
//! - [`BoundedTopKRetainer`](ds::BoundedTopKRetainer) /
//!   [`BoundedBottomKRetainer`](ds::BoundedBottomKRetainer): keep the K most
//!   extreme scores of a stream for working-set selection.
//!
//! Operation counters live behind the `metrics` feature.

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod traits;

#[cfg(feature = "metrics")]
pub mod metrics;
