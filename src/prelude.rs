pub use crate::builder::{RowCacheBuilder, ShrinkMode};
pub use crate::ds::{
    Admission, BoundedBottomKRetainer, BoundedRetainer, BoundedTopKRetainer, Largest, Phase,
    Retention, Smallest,
};
pub use crate::error::{AccessError, ConfigError, InvariantError};
pub use crate::policy::row_cache::RowCache;
pub use crate::traits::Row;

#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::{RetainerMetricsSnapshot, RowCacheMetricsSnapshot};
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::{MetricsExporter, MetricsReset, MetricsSnapshotProvider};
