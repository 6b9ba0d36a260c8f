#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub insert_calls: u64,
    pub insert_new: u64,
    pub insert_updates: u64,
    pub invalid_slot_reuses: u64, // put landed on a slot invalidated by swap
    pub evicted_entries: u64,
    pub shift_steps: u64, // slots moved to keep keys sorted

    pub renew_calls: u64,
    pub renew_found: u64,
    pub contains_calls: u64,
    pub contains_found: u64,
    pub peek_calls: u64,
    pub peek_found: u64,

    pub swap_calls: u64,
    pub swap_moved_rows: u64,
    pub swap_invalidated: u64,
    pub coordinate_swaps: u64, // live rows whose coordinates were exchanged

    pub shrink_calls: u64,
    pub init_calls: u64,
    pub clear_calls: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: usize,
    pub dimension: usize,
}

impl RowCacheMetricsSnapshot {
    /// Fraction of `get` calls that hit, or `0.0` before the first call.
    pub fn hit_rate(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetainerMetricsSnapshot {
    pub add_calls: u64,
    pub appended: u64,
    pub heapify_passes: u64,
    pub replaced: u64,
    pub rejected: u64,
    pub sift_steps: u64,
    pub clear_calls: u64,

    pub len: usize,
    pub capacity: usize,
}
