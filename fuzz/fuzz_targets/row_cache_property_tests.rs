#![no_main]

use std::collections::HashMap;

use kernelkit::policy::row_cache::RowCache;
use libfuzzer_sys::fuzz_target;

// Fuzz property-based tests for RowCache
//
// Tests specific invariants and properties:
// - LRU victim selection against a recency model
// - Coordinate exchange on swap
// - Shrink truncation and domain filtering
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let capacity = (data[0] % 12) as usize + 1;
    match data[1] % 3 {
        0 => test_lru_model(capacity, &data[2..]),
        1 => test_swap_exchanges_coordinates(capacity, &data[2..]),
        2 => test_shrink_truncates(capacity, &data[2..]),
        _ => unreachable!(),
    }
});

fn row_for(key: usize, dimension: usize) -> Vec<u32> {
    (0..dimension).map(|c| (key * 1000 + c) as u32).collect()
}

// Property: the evicted key always has the smallest recency stamp
fn test_lru_model(capacity: usize, data: &[u8]) {
    const DIMENSION: usize = 64;
    let mut cache = RowCache::new(capacity, DIMENSION);
    let mut model: HashMap<usize, u64> = HashMap::new();
    let mut clock = 0u64;

    for &byte in data {
        let key = (byte % DIMENSION as u8) as usize;
        if byte & 0x80 != 0 {
            if cache.get(key).is_some() {
                clock += 1;
                model.insert(key, clock);
            } else {
                assert!(!model.contains_key(&key));
            }
            continue;
        }
        if model.contains_key(&key) {
            continue;
        }
        let expected = (model.len() == capacity)
            .then(|| model.iter().min_by_key(|&(_, &t)| t).map(|(&k, _)| k))
            .flatten();
        let evicted = cache.put(key, row_for(key, DIMENSION)).unwrap();
        assert_eq!(evicted.as_ref().map(|(k, _)| *k), expected);
        if let Some((victim, row)) = evicted {
            assert_eq!(row, row_for(victim, DIMENSION));
            model.remove(&victim);
        }
        clock += 1;
        model.insert(key, clock);
    }
}

// Property: every row that survives a swap has coordinates i and j exchanged
fn test_swap_exchanges_coordinates(capacity: usize, data: &[u8]) {
    const DIMENSION: usize = 16;
    let mut cache = RowCache::new(capacity, DIMENSION);
    for &byte in data.iter().take(capacity * 2) {
        let key = (byte as usize) % DIMENSION;
        let _ = cache.put(key, row_for(key, DIMENSION));
    }

    cache.begin_renumbering();
    for pair in data.chunks_exact(2) {
        let i = (pair[0] as usize) % DIMENSION;
        let j = (pair[1] as usize) % DIMENSION;
        let before: HashMap<usize, Vec<u32>> =
            cache.iter().map(|(k, r)| (k, r.clone())).collect();

        cache.swap(i, j).unwrap();

        for (key, row) in cache.iter() {
            let source = if i != j && key == i { j } else { key };
            let original = &before[&source];
            assert_eq!(row[i], original[j]);
            assert_eq!(row[j], original[i]);
        }
        cache.debug_validate_invariants();
    }
    cache.end_renumbering();
}

// Property: shrink keeps only in-domain keys and truncates every row
fn test_shrink_truncates(capacity: usize, data: &[u8]) {
    const DIMENSION: usize = 32;
    let mut cache = RowCache::new(capacity, DIMENSION);
    for &byte in data {
        let key = (byte as usize) % DIMENSION;
        let _ = cache.put(key, row_for(key, DIMENSION));
    }

    let new_dimension = (data[0] as usize % DIMENSION) + 1;
    let new_capacity = (data[data.len() - 1] as usize % 12) + 1;
    cache.shrink(new_capacity, new_dimension).unwrap();

    assert!(cache.len() <= new_capacity);
    for (key, row) in cache.iter() {
        assert!(key < new_dimension);
        assert_eq!(row.as_slice(), &row_for(key, DIMENSION)[..new_dimension]);
    }
    cache.debug_validate_invariants();
}
