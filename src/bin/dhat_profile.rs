//! DHAT heap profiler for kernelkit.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>
//!
//! Each workload warms its structure up, then reports how many heap blocks
//! the steady-state phase allocated. Both phases should report zero.

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use kernelkit::ds::{BoundedBottomKRetainer, BoundedTopKRetainer};
use kernelkit::policy::row_cache::RowCache;

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

/// Stand-in for a kernel evaluation: deterministic, cheap, fills in place.
fn fill_row(row: &mut [f64], key: usize) {
    for (coord, slot) in row.iter_mut().enumerate() {
        *slot = ((key * 31 + coord) % 97) as f64 / 97.0;
    }
}

fn blocks_since(start: u64) -> u64 {
    dhat::HeapStats::get().total_blocks - start
}

/// Hotset access: 90% of requests hit 10% of the training points. Misses
/// reuse the buffer of the row they evict.
fn row_cache_hotset(
    cache: &mut RowCache<Vec<f64>>,
    spare: &mut Option<Vec<f64>>,
    operations: usize,
    seed: u64,
) {
    let mut rng = XorShift64::new(seed);
    let dimension = cache.dimension();
    let hot_size = dimension / 10;

    for _ in 0..operations {
        let key = if rng.next_f64() < 0.9 {
            (rng.next_u64() as usize) % hot_size
        } else {
            hot_size + (rng.next_u64() as usize) % (dimension - hot_size)
        };
        if cache.get(key).is_some() {
            continue;
        }
        let mut row = spare.take().unwrap_or_else(|| vec![0.0; dimension]);
        fill_row(&mut row, key);
        if let Ok(Some((_, evicted))) = cache.put(key, row) {
            *spare = Some(evicted);
        }
    }
}

fn profile_row_cache() {
    println!("=== Profiling RowCache ===");
    let capacity = 512;
    let dimension = 8_192;
    let operations = 200_000;

    let mut cache: RowCache<Vec<f64>> = RowCache::new(capacity, dimension);
    let mut spare = None;

    // Warm up until every slot holds a row
    for key in 0..capacity + 1 {
        let mut row = spare.take().unwrap_or_else(|| vec![0.0; dimension]);
        fill_row(&mut row, key);
        if let Ok(Some((_, evicted))) = cache.put(key, row) {
            spare = Some(evicted);
        }
    }

    let start = dhat::HeapStats::get().total_blocks;
    row_cache_hotset(&mut cache, &mut spare, operations, 42);
    println!("  Live rows: {}", cache.len());
    println!("  Steady-state allocations: {}", blocks_since(start));
}

fn profile_retainers() {
    println!("=== Profiling BoundedRetainer ===");
    let k = 64;
    let stream = 1_000_000;

    let mut top: BoundedTopKRetainer = BoundedTopKRetainer::new(k);
    let mut bottom: BoundedBottomKRetainer = BoundedBottomKRetainer::new(k);
    let mut rng = XorShift64::new(7);

    let start = dhat::HeapStats::get().total_blocks;
    for index in 0..stream {
        let score = rng.next_f64() * 2.0 - 1.0;
        top.add(score, index);
        bottom.add(score, index);
    }
    println!("  Top threshold: {:?}", top.top());
    println!("  Bottom threshold: {:?}", bottom.top());
    println!("  Streaming allocations: {}", blocks_since(start));
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    println!("kernelkit DHAT Heap Profiling");
    println!("=============================\n");

    profile_row_cache();
    profile_retainers();

    println!("\n=============================");
    println!("Profiling complete!");
    println!(
        "View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>"
    );
}
