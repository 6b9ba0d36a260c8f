#![no_main]

use kernelkit::ds::{Admission, BoundedBottomKRetainer, BoundedTopKRetainer, Phase};
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on both retainer directions
//
// Tests random sequences of add, clear and read operations, including NaN scores.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let k = (data[0] % 32) as usize + 1;
    let mut top: BoundedTopKRetainer<f32, usize> = BoundedTopKRetainer::new(k);
    let mut bottom: BoundedBottomKRetainer<f32, usize> = BoundedBottomKRetainer::new(k);

    let mut idx = 1;
    while idx + 4 < data.len() {
        let op = data[idx] % 4;
        let bits = u32::from_le_bytes([data[idx + 1], data[idx + 2], data[idx + 3], data[idx + 4]]);
        let value = f32::from_bits(bits);

        match op {
            0 | 1 => {
                // add
                let was_full = top.is_full();
                let threshold = top.top();
                let admission = top.add(value, idx);
                if value.is_nan() {
                    assert_eq!(admission, Admission::Rejected);
                } else if !was_full {
                    assert_eq!(admission, Admission::Appended);
                } else if let Some(threshold) = threshold {
                    assert_eq!(admission == Admission::Rejected, value < threshold);
                }
                bottom.add(value, idx);
            },
            2 => {
                // clear
                top.clear();
                bottom.clear();
                assert_eq!(top.phase(), Phase::Filling);
                assert!(bottom.is_empty());
            },
            3 => {
                // reads
                assert_eq!(top.values().len(), top.len());
                assert_eq!(top.top().is_some(), top.is_full());
                assert_eq!(bottom.entries().count(), bottom.len());
            },
            _ => unreachable!(),
        }

        top.debug_validate_invariants();
        bottom.debug_validate_invariants();
        idx += 5;
    }
});
