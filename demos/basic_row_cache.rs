//! Kernel row caching for a small RBF problem.
//!
//! Run with: `cargo run --example basic_row_cache`

use kernelkit::policy::row_cache::RowCache;

fn rbf(a: f64, b: f64) -> f64 {
    (-(a - b) * (a - b)).exp()
}

fn main() {
    let points: Vec<f64> = (0..32).map(|i| (i as f64 * 0.37).sin()).collect();
    let dimension = points.len();
    let mut cache: RowCache<Vec<f64>> = RowCache::new(6, dimension);
    let mut spare: Option<Vec<f64>> = None;
    let mut computed = 0;

    // A solver revisits a handful of points far more often than the rest
    let requests = [0, 1, 2, 0, 1, 3, 0, 4, 1, 5, 0, 6, 1, 7, 0, 2, 1, 3];
    for &id in &requests {
        if cache.get(id).is_none() {
            let mut row = spare.take().unwrap_or_else(|| vec![0.0; dimension]);
            for (col, value) in row.iter_mut().enumerate() {
                *value = rbf(points[id], points[col]);
            }
            computed += 1;
            if let Ok(Some((evicted, buffer))) = cache.put(id, row) {
                println!("evicted row {evicted}");
                spare = Some(buffer);
            }
        }
    }
    println!(
        "{} requests, {} rows computed, live rows: {:?}",
        requests.len(),
        computed,
        cache.live_keys().collect::<Vec<_>>()
    );

    // Drop the last 16 points from the active set
    cache.begin_renumbering();
    for (i, j) in (0..4).zip((28..32).rev()) {
        if let Err(e) = cache.swap(i, j) {
            eprintln!("swap failed: {e}");
        }
    }
    if let Err(e) = cache.shrink(4, 16) {
        eprintln!("shrink failed: {e}");
    }
    println!(
        "after shrink: capacity {}, dimension {}, live rows {:?}",
        cache.capacity(),
        cache.dimension(),
        cache.live_keys().collect::<Vec<_>>()
    );
}
