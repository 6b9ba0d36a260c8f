//! Working-set selection with bounded retainers.
//!
//! Run with: `cargo run --example basic_top_k`

use kernelkit::ds::{BoundedBottomKRetainer, BoundedTopKRetainer};

fn main() {
    let gradient: Vec<f64> = (0..1_000)
        .map(|i| ((i * 7_919) % 1_000) as f64 / 500.0 - 1.0)
        .collect();

    let mut up: BoundedTopKRetainer = BoundedTopKRetainer::new(4);
    let mut down: BoundedBottomKRetainer = BoundedBottomKRetainer::new(4);
    for (index, &g) in gradient.iter().enumerate() {
        up.add(g, index);
        down.add(g, index);
    }

    println!("admission thresholds: up {:?}, down {:?}", up.top(), down.top());
    for (score, index) in up.into_sorted_vec() {
        println!("  up   {index:>4}  {score:+.3}");
    }
    for (score, index) in down.into_sorted_vec() {
        println!("  down {index:>4}  {score:+.3}");
    }
}
