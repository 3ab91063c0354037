// ==============================================
// CROSS-ENGINE INVARIANT TESTS (integration)
// ==============================================
//
// Behaviour every memoizer shares, checked through the public API only.

use std::cell::Cell;
use std::sync::Arc;

use memokit::builder::{MemoBuilder, MemoPolicy};
use memokit::func::{CachedBiFunc, CachedFunc, CachedScalar, CachedText};
use memokit::key::ArgPair;
use memokit::policy::bounded_hits::BoundedHitCache;
use memokit::policy::reclaimable::ReclaimableCache;
use memokit::policy::weak_key::WeakKeyStore;
use memokit::reclaim::MemoryPressure;
use memokit::reclaim::policy::NeverReclaim;
use memokit::traits::{BiFunc, Func, Memoizer, Scalar, Text};

// ==============================================
// Idempotence: a hit never calls the origin
// ==============================================

mod idempotence {
    use super::*;

    fn assert_single_compute<M>(mut memo: M)
    where
        M: Memoizer<u32, u32>,
        M::Output: std::fmt::Debug + PartialEq,
    {
        let calls = Cell::new(0);
        let compute = |k: &u32| {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(k * 7)
        };

        let first = memo.get_or_compute(6, compute).unwrap();
        let second = memo.get_or_compute(6, compute).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert!(memo.contains(&6));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn bounded() {
        assert_single_compute(BoundedHitCache::new(4));
    }

    #[test]
    fn reclaimable() {
        assert_single_compute(ReclaimableCache::new());
    }

    #[test]
    fn builder_memos() {
        assert_single_compute(MemoBuilder::new().capacity(4).try_build().unwrap());
        assert_single_compute(
            MemoBuilder::new()
                .policy(MemoPolicy::Reclaimable { pressure: None })
                .try_build()
                .unwrap(),
        );
    }
}

// ==============================================
// Failure transparency
// ==============================================

mod failures {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct OriginError(&'static str);

    fn assert_failure_leaves_no_trace<M>(mut memo: M)
    where
        M: Memoizer<u32, u32>,
        M::Output: std::fmt::Debug,
    {
        memo.get_or_compute(1, |_| Ok::<_, OriginError>(1)).unwrap();
        let before = memo.len();

        let err = memo.get_or_compute(2, |_| Err(OriginError("unavailable"))).unwrap_err();

        assert_eq!(err, OriginError("unavailable"));
        assert_eq!(memo.len(), before);
        assert!(!memo.contains(&2));
        assert!(memo.contains(&1));
    }

    #[test]
    fn bounded() {
        assert_failure_leaves_no_trace(BoundedHitCache::new(1));
    }

    #[test]
    fn reclaimable() {
        assert_failure_leaves_no_trace(ReclaimableCache::new());
    }

    #[test]
    fn failing_origin_is_retried_every_time() {
        let calls = Cell::new(0);
        let mut f = CachedFunc::bounded(
            |_: &u8| {
                calls.set(calls.get() + 1);
                Err::<u8, _>(OriginError("down"))
            },
            4,
        );

        for _ in 0..3 {
            assert_eq!(f.apply(&1), Err(OriginError("down")));
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn bounded_hit_counts_survive_failures() {
        let mut cache = BoundedHitCache::new(2);
        cache.get_or_compute("a", |_| Ok::<_, OriginError>(1)).unwrap();
        cache.get_or_compute("a", |_| Ok::<_, OriginError>(1)).unwrap();

        let _ = cache.get_or_compute("b", |_| Err(OriginError("x")));

        assert_eq!(cache.hits(&"a"), Some(2));
        assert!(cache.check_invariants().is_ok());
    }
}

// ==============================================
// Bounded eviction order
// ==============================================

mod bounded_eviction {
    use super::*;

    #[test]
    fn worked_example() {
        let mut cache = BoundedHitCache::new(2);
        for key in ["A", "B", "A", "C"] {
            cache.get_or_compute(key, |k| Ok::<_, ()>(k.to_lowercase())).unwrap();
        }

        let mut state: Vec<_> = cache.iter_hits().map(|(k, h)| (*k, h)).collect();
        state.sort_unstable();
        assert_eq!(state, vec![("A", 2), ("C", 1)]);
    }

    #[test]
    fn hot_keys_outlive_a_scan() {
        let mut cache = BoundedHitCache::new(4);
        for _ in 0..3 {
            for hot in 0..2u32 {
                cache.get_or_compute(hot, |k| Ok::<_, ()>(*k)).unwrap();
            }
        }
        for cold in 100..200u32 {
            cache.get_or_compute(cold, |k| Ok::<_, ()>(*k)).unwrap();
        }

        assert!(cache.contains(&0));
        assert!(cache.contains(&1));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn capacity_zero_always_computes() {
        let calls = Cell::new(0);
        let mut f = CachedBiFunc::bounded(
            |a: &i32, b: &i32| {
                calls.set(calls.get() + 1);
                Ok::<_, ()>(a * b)
            },
            0,
        );

        assert_eq!(f.apply(&3, &4), Ok(12));
        assert_eq!(f.apply(&3, &4), Ok(12));
        assert_eq!(calls.get(), 2);
        assert_eq!(f.memo().len(), 0);
    }
}

// ==============================================
// Key structure
// ==============================================

mod keys {
    use super::*;

    #[test]
    fn argument_order_matters() {
        let mut sub = CachedBiFunc::bounded(|a: &i32, b: &i32| Ok::<_, ()>(a - b), 8);
        assert_eq!(sub.apply(&5, &3), Ok(2));
        assert_eq!(sub.apply(&3, &5), Ok(-2));
        assert_eq!(sub.memo().len(), 2);
        assert!(sub.memo().contains(&ArgPair::new(5, 3)));
    }

    #[test]
    fn owned_string_keys_match_by_content() {
        let calls = Cell::new(0);
        let mut upper = CachedFunc::reclaimable(|s: &String| {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(s.to_uppercase())
        });

        let a = upper.apply(&String::from("abc")).unwrap();
        let b = upper.apply(&"abc".to_owned()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn weak_keys_match_by_content_while_alive() {
        let mut store = WeakKeyStore::new();
        let k1 = Arc::new(ArgPair::new(1u8, 2u8));
        let k2 = Arc::new(ArgPair::new(1u8, 2u8));

        store.get_or_compute(Arc::clone(&k1), |_| Ok::<_, ()>("v")).unwrap();
        assert_eq!(store.get_or_compute(k2, |_| Ok::<_, ()>("other")), Ok("v"));
    }
}

// ==============================================
// Nullary adapters
// ==============================================

mod nullary {
    use super::*;

    #[test]
    fn scalar_never_recomputes_without_pressure() {
        let calls = Cell::new(0);
        let pressure = MemoryPressure::with_policy(NeverReclaim);
        let mut scalar = CachedScalar::reclaimable_with(
            || {
                calls.set(calls.get() + 1);
                Ok::<_, ()>(3.5f64)
            },
            pressure.clone(),
        );

        for _ in 0..10 {
            assert_eq!(*scalar.value().unwrap(), 3.5);
            pressure.reclaim();
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn text_is_stable_across_reclamation() {
        let pressure = MemoryPressure::new();
        let counter = Cell::new(0);
        let mut text = CachedText::reclaimable_with(
            || {
                counter.set(counter.get() + 1);
                Ok::<_, ()>(String::from("stable"))
            },
            pressure.clone(),
        );

        let before = text.as_string().unwrap();
        pressure.reclaim_all();
        let after = text.as_string().unwrap();

        assert_eq!(before, after);
        assert_eq!(counter.get(), 2);
    }
}
