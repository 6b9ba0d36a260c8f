pub mod row_cache;

pub use row_cache::RowCache;
