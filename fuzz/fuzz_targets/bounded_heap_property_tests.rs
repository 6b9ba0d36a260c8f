#![no_main]

use kernelkit::ds::{BoundedBottomKRetainer, BoundedTopKRetainer};
use libfuzzer_sys::fuzz_target;

// Fuzz property-based tests for BoundedRetainer
//
// Tests specific invariants and properties:
// - Retained set equals the K largest (smallest) of the stream
// - top() equals the boundary of the retained set
// - Retained indices point at their own values
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let k = (data[0] % 24) as usize + 1;
    let stream: Vec<i16> = data[1..]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let mut top: BoundedTopKRetainer<i16, usize> = BoundedTopKRetainer::new(k);
    let mut bottom: BoundedBottomKRetainer<i16, usize> = BoundedBottomKRetainer::new(k);
    for (index, &value) in stream.iter().enumerate() {
        top.add(value, index);
        bottom.add(value, index);
    }

    let mut sorted = stream.clone();
    sorted.sort_unstable();
    let kept = k.min(stream.len());

    let mut largest: Vec<i16> = top.entries().map(|(v, _)| v).collect();
    largest.sort_unstable();
    assert_eq!(largest, sorted[sorted.len() - kept..]);

    let mut smallest: Vec<i16> = bottom.entries().map(|(v, _)| v).collect();
    smallest.sort_unstable();
    assert_eq!(smallest, sorted[..kept]);

    if stream.len() >= k {
        assert_eq!(top.top(), largest.first().copied());
        assert_eq!(bottom.top(), smallest.last().copied());
    } else {
        assert_eq!(top.top(), None);
    }

    for (value, index) in top.entries().chain(bottom.entries()) {
        assert_eq!(stream[index], value);
    }
});
