#![no_main]

use kernelkit::policy::row_cache::RowCache;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on RowCache
//
// Tests random sequences of get, put, renew, contains, swap, shrink and init.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = (data[0] % 16) as usize + 1;
    let dimension = (data[1] % 32) as usize + 1;
    let mut cache: RowCache<Vec<u16>> = RowCache::new(capacity, dimension);

    let mut idx = 2;
    while idx + 2 < data.len() {
        let op = data[idx] % 9;
        let a = data[idx + 1] as usize;
        let b = data[idx + 2] as usize;
        let dimension = cache.dimension();

        match op {
            0 => {
                // get
                let hit = cache.get(a).is_some();
                assert_eq!(hit, cache.contains(a));
            },
            1 => {
                // put, keys outside the domain must be rejected
                let row: Vec<u16> = (0..dimension).map(|c| (a * 64 + c) as u16).collect();
                let old_len = cache.len();
                match cache.put(a, row.clone()) {
                    Ok(evicted) => {
                        assert!(a < dimension);
                        assert_eq!(cache.peek(a), Some(&row));
                        if evicted.is_some() {
                            assert_eq!(cache.len(), old_len);
                        }
                    },
                    Err(_) => assert!(a >= dimension),
                }
            },
            2 => {
                // renew agrees with contains
                let live = cache.contains(a);
                assert_eq!(cache.renew(a), live);
            },
            3 => {
                // swap inside a window
                cache.begin_renumbering();
                let result = cache.swap(a, b);
                assert_eq!(result.is_ok(), a < dimension && b < dimension);
            },
            4 => {
                // swap outside a window is refused
                cache.end_renumbering();
                assert!(cache.swap(a % dimension, b % dimension).is_err());
            },
            5 => {
                // shrink
                let new_capacity = (a % 16) + 1;
                let new_dimension = (b % dimension) + 1;
                cache.shrink(new_capacity, new_dimension).unwrap();
                assert_eq!(cache.capacity(), new_capacity);
                assert_eq!(cache.dimension(), new_dimension);
                assert!(!cache.is_renumbering());
            },
            6 => {
                // init
                let new_capacity = (a % 16) + 1;
                cache.init(new_capacity).unwrap();
                assert!(cache.is_empty());
            },
            7 => {
                // peek_lru points at a live key
                if let Some(key) = cache.peek_lru() {
                    assert!(cache.contains(key));
                } else {
                    assert!(cache.is_empty());
                }
            },
            8 => {
                // clear
                cache.clear();
                assert!(cache.is_empty());
            },
            _ => unreachable!(),
        }

        assert!(cache.len() <= cache.capacity());
        cache.debug_validate_invariants();
        idx += 3;
    }
});
