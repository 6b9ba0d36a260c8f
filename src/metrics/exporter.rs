use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::{RetainerMetricsSnapshot, RowCacheMetricsSnapshot};
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for metrics snapshots.
///
/// Writes the Prometheus text exposition format so a solver can dump its
/// cache statistics at the end of a training run and have them scraped or
/// forwarded to a collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_sample(&self, kind: &str, name: &str, value: u64) {
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_sample("counter", &self.metric_name(suffix), value);
    }

    fn write_gauge(&self, suffix: &str, value: u64) {
        self.write_sample("gauge", &self.metric_name(suffix), value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<RowCacheMetricsSnapshot>
    for PrometheusTextExporter<W>
{
    fn export(&self, snapshot: &RowCacheMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("insert_calls_total", snapshot.insert_calls);
        self.write_counter("insert_new_total", snapshot.insert_new);
        self.write_counter("insert_updates_total", snapshot.insert_updates);
        self.write_counter(
            "invalid_slot_reuses_total",
            snapshot.invalid_slot_reuses,
        );
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("shift_steps_total", snapshot.shift_steps);
        self.write_counter("renew_calls_total", snapshot.renew_calls);
        self.write_counter("renew_found_total", snapshot.renew_found);
        self.write_counter("contains_calls_total", snapshot.contains_calls);
        self.write_counter("contains_found_total", snapshot.contains_found);
        self.write_counter("peek_calls_total", snapshot.peek_calls);
        self.write_counter("peek_found_total", snapshot.peek_found);
        self.write_counter("swap_calls_total", snapshot.swap_calls);
        self.write_counter("swap_moved_rows_total", snapshot.swap_moved_rows);
        self.write_counter("swap_invalidated_total", snapshot.swap_invalidated);
        self.write_counter("coordinate_swaps_total", snapshot.coordinate_swaps);
        self.write_counter("shrink_calls_total", snapshot.shrink_calls);
        self.write_counter("init_calls_total", snapshot.init_calls);
        self.write_counter("clear_calls_total", snapshot.clear_calls);
        self.write_gauge("cache_len", snapshot.cache_len as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
        self.write_gauge("dimension", snapshot.dimension as u64);
    }
}

impl<W: Write + Send + Sync> MetricsExporter<RetainerMetricsSnapshot>
    for PrometheusTextExporter<W>
{
    fn export(&self, snapshot: &RetainerMetricsSnapshot) {
        self.write_counter("add_calls_total", snapshot.add_calls);
        self.write_counter("appended_total", snapshot.appended);
        self.write_counter("heapify_passes_total", snapshot.heapify_passes);
        self.write_counter("replaced_total", snapshot.replaced);
        self.write_counter("rejected_total", snapshot.rejected);
        self.write_counter("sift_steps_total", snapshot.sift_steps);
        self.write_counter("clear_calls_total", snapshot.clear_calls);
        self.write_gauge("len", snapshot.len as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_row_cache_counters_with_prefix() {
        let exporter = PrometheusTextExporter::new("svm_rows", Vec::new());
        let snapshot = RowCacheMetricsSnapshot {
            get_calls: 5,
            get_hits: 3,
            capacity: 16,
            ..Default::default()
        };
        exporter.export(&snapshot);

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("# TYPE svm_rows_get_calls_total counter"));
        assert!(text.contains("svm_rows_get_calls_total 5"));
        assert!(text.contains("svm_rows_get_hits_total 3"));
        assert!(text.contains("# TYPE svm_rows_capacity gauge"));
        assert!(text.contains("svm_rows_capacity 16"));
    }

    #[test]
    fn exports_retainer_counters_without_prefix() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        let snapshot = RetainerMetricsSnapshot {
            add_calls: 10,
            rejected: 4,
            ..Default::default()
        };
        exporter.export(&snapshot);

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("add_calls_total 10"));
        assert!(text.contains("rejected_total 4"));
        assert!(text.lines().all(|line| !line.starts_with('_')));
    }
}
