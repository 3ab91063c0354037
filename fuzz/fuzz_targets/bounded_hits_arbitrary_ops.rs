#![no_main]

use libfuzzer_sys::fuzz_target;
use memokit::policy::bounded_hits::BoundedHitCache;
use memokit::traits::Memoizer;

// Fuzz arbitrary lookup sequences on BoundedHitCache
//
// First byte picks the capacity; every following byte pair is (op, key).
// Failing computes must leave the table untouched.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(cap % 16);
    let mut cache: BoundedHitCache<u8, u16> = BoundedHitCache::new(capacity);

    for pair in ops.chunks_exact(2) {
        let (op, key) = (pair[0], pair[1] % 32);
        match op % 4 {
            0 | 1 => {
                // successful lookup
                let was_resident = cache.contains(&key);
                let hits_before = cache.hits(&key);
                let value = cache.get_or_compute(key, |k| Ok::<_, ()>(u16::from(*k) * 3));
                assert_eq!(value, Ok(u16::from(key) * 3));

                if was_resident {
                    assert_eq!(cache.hits(&key), hits_before.map(|h| h + 1));
                } else if capacity > 0 {
                    assert_eq!(cache.hits(&key), Some(1));
                }
            }
            2 => {
                // failing lookup
                let len = cache.len();
                let resident = cache.contains(&key);
                let result = cache.get_or_compute(key, |_| Err::<u16, _>("fail"));
                if resident {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(result, Err("fail"));
                    assert_eq!(cache.len(), len);
                    assert!(!cache.contains(&key));
                }
            }
            _ => {
                // loser must hold the minimum hit count
                if let Some((_, loser_hits)) = cache.loser() {
                    assert!(cache.iter_hits().all(|(_, h)| h >= loser_hits));
                } else {
                    assert!(cache.is_empty());
                }
            }
        }

        assert!(cache.len() <= capacity);
        assert!(cache.check_invariants().is_ok());
    }
});
