use crate::metrics::cell::MetricsCell;
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsReset, RetainerMetricsRecorder, RowCacheMetricsReadRecorder,
    RowCacheMetricsRecorder,
};

#[derive(Debug, Default)]
pub struct RowCacheMetrics {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub insert_calls: u64,
    pub insert_new: u64,
    pub insert_updates: u64,
    pub invalid_slot_reuses: u64,
    pub evicted_entries: u64,
    pub shift_steps: u64,
    pub renew_calls: u64,
    pub renew_found: u64,
    pub contains_calls: MetricsCell,
    pub contains_found: MetricsCell,
    pub peek_calls: MetricsCell,
    pub peek_found: MetricsCell,
    pub swap_calls: u64,
    pub swap_moved_rows: u64,
    pub swap_invalidated: u64,
    pub coordinate_swaps: u64,
    pub shrink_calls: u64,
    pub init_calls: u64,
    pub clear_calls: u64,
}

impl CoreMetricsRecorder for RowCacheMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }

    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }

    fn record_insert_call(&mut self) {
        self.insert_calls += 1;
    }

    fn record_insert_new(&mut self) {
        self.insert_new += 1;
    }

    fn record_insert_update(&mut self) {
        self.insert_updates += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    fn record_clear(&mut self) {
        self.clear_calls += 1;
    }
}

impl RowCacheMetricsRecorder for RowCacheMetrics {
    fn record_invalid_slot_reuse(&mut self) {
        self.invalid_slot_reuses += 1;
    }

    fn record_shift_steps(&mut self, steps: u64) {
        self.shift_steps += steps;
    }

    fn record_renew_call(&mut self) {
        self.renew_calls += 1;
    }

    fn record_renew_found(&mut self) {
        self.renew_found += 1;
    }

    fn record_swap_call(&mut self) {
        self.swap_calls += 1;
    }

    fn record_swap_moved_row(&mut self) {
        self.swap_moved_rows += 1;
    }

    fn record_swap_invalidated(&mut self) {
        self.swap_invalidated += 1;
    }

    fn record_coordinate_swaps(&mut self, rows: u64) {
        self.coordinate_swaps += rows;
    }

    fn record_shrink(&mut self) {
        self.shrink_calls += 1;
    }

    fn record_init(&mut self) {
        self.init_calls += 1;
    }
}

impl RowCacheMetricsReadRecorder for RowCacheMetrics {
    fn record_contains_call(&self) {
        self.contains_calls.incr();
    }

    fn record_contains_found(&self) {
        self.contains_found.incr();
    }

    fn record_peek_call(&self) {
        self.peek_calls.incr();
    }

    fn record_peek_found(&self) {
        self.peek_found.incr();
    }
}

impl MetricsReset for RowCacheMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Default, Clone)]
pub struct RetainerMetrics {
    pub add_calls: u64,
    pub appended: u64,
    pub heapify_passes: u64,
    pub replaced: u64,
    pub rejected: u64,
    pub sift_steps: u64,
    pub clear_calls: u64,
}

impl RetainerMetricsRecorder for RetainerMetrics {
    fn record_add_call(&mut self) {
        self.add_calls += 1;
    }

    fn record_append(&mut self) {
        self.appended += 1;
    }

    fn record_heapify(&mut self) {
        self.heapify_passes += 1;
    }

    fn record_replace(&mut self) {
        self.replaced += 1;
    }

    fn record_reject(&mut self) {
        self.rejected += 1;
    }

    fn record_sift_steps(&mut self, steps: u64) {
        self.sift_steps += steps;
    }

    fn record_clear(&mut self) {
        self.clear_calls += 1;
    }
}

impl MetricsReset for RetainerMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_cache_metrics_count_hits_and_misses() {
        let mut m = RowCacheMetrics::default();
        m.record_get_hit();
        m.record_get_hit();
        m.record_get_miss();
        assert_eq!(m.get_calls, 3);
        assert_eq!(m.get_hits, 2);
        assert_eq!(m.get_misses, 1);
    }

    #[test]
    fn row_cache_read_recorder_uses_cells() {
        let m = RowCacheMetrics::default();
        m.record_contains_call();
        m.record_contains_found();
        m.record_peek_call();
        assert_eq!(m.contains_calls.get(), 1);
        assert_eq!(m.contains_found.get(), 1);
        assert_eq!(m.peek_calls.get(), 1);
        assert_eq!(m.peek_found.get(), 0);
    }

    #[test]
    fn reset_clears_every_counter() {
        let mut m = RowCacheMetrics::default();
        m.record_shift_steps(7);
        m.record_contains_call();
        m.reset_metrics();
        assert_eq!(m.shift_steps, 0);
        assert_eq!(m.contains_calls.get(), 0);

        let mut r = RetainerMetrics::default();
        r.record_add_call();
        r.record_reject();
        r.reset_metrics();
        assert_eq!(r.add_calls, 0);
        assert_eq!(r.rejected, 0);
    }
}
