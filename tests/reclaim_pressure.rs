// ==============================================
// MEMORY PRESSURE INTEGRATION TESTS
// ==============================================
//
// Reclaimable caches driven by an external pressure handle, across policies,
// sinks and threads.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use memokit::func::CachedFunc;
use memokit::policy::reclaimable::ReclaimableCache;
use memokit::reclaim::policy::{LeastRecentlyTouched, NeverReclaim, RandomReclaim};
use memokit::reclaim::{MemoryPressure, ReclaimQueue};
use memokit::traits::{Func, Memoizer};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn queue_sees_each_reclaimed_slot_exactly_once() {
    init_tracing();
    let pressure = MemoryPressure::new();
    let queue = ReclaimQueue::new();
    let mut cache = ReclaimableCache::with_pressure(pressure.clone()).with_sink(queue.clone());

    for key in 0..10u32 {
        cache.get_or_compute(key, |k| Ok::<_, ()>(k * 2)).unwrap();
    }
    pressure.reclaim();

    // two sweeps over the same reclaimed state
    cache.sweep();
    cache.sweep();
    cache.get_or_compute(100, |k| Ok::<_, ()>(*k)).unwrap();

    let notices = queue.drain();
    let slots: HashSet<_> = notices.iter().map(|n| n.slot).collect();
    let keys: HashSet<_> = notices.iter().map(|n| n.key).collect();
    assert_eq!(notices.len(), 10);
    assert_eq!(slots.len(), 10);
    assert_eq!(keys, (0..10).collect());
}

#[test]
fn hit_only_traffic_still_purges_and_reports() {
    init_tracing();
    let pressure = MemoryPressure::new();
    let queue = ReclaimQueue::new();
    let mut cache = ReclaimableCache::with_pressure(pressure.clone()).with_sink(queue.clone());

    let hot = cache.get_or_compute("hot", |k| Ok::<_, &str>(k.len())).unwrap();
    for key in ["cold-1", "cold-2", "cold-3"] {
        cache.get_or_compute(key, |k| Ok::<_, ()>(k.len())).unwrap();
    }
    assert_eq!(pressure.reclaim(), 3);
    assert!(queue.is_empty());

    for _ in 0..5 {
        let value = cache.get_or_compute("hot", |_| Err("recomputed a held value")).unwrap();
        assert!(Arc::ptr_eq(&hot, &value));
    }

    assert_eq!(cache.len(), 1);
    let mut purged: Vec<&str> = queue.drain().into_iter().map(|n| n.key).collect();
    purged.sort_unstable();
    assert_eq!(purged, vec!["cold-1", "cold-2", "cold-3"]);
}

#[test]
fn several_caches_share_one_pressure_handle() {
    init_tracing();
    let pressure = MemoryPressure::with_policy(NeverReclaim);
    let mut squares = CachedFunc::reclaimable_with(|x: &u64| Ok::<_, ()>(x * x), pressure.clone());
    let mut names = CachedFunc::reclaimable_with(|x: &u64| Ok::<_, ()>(format!("#{x}")), pressure.clone());

    for x in 0..5 {
        squares.apply(&x).unwrap();
        names.apply(&x).unwrap();
    }
    assert_eq!(pressure.held(), 10);

    assert_eq!(pressure.reclaim(), 0);
    assert_eq!(pressure.reclaim_all(), 10);
    assert!(!squares.memo().contains(&memokit::key::ArgPair::unary(0)));
    assert!(!names.memo().contains(&memokit::key::ArgPair::unary(4)));
}

#[test]
fn budget_policy_caps_unreferenced_values() {
    init_tracing();
    let budget = 5;
    let pressure = MemoryPressure::with_policy(LeastRecentlyTouched::new(budget));
    let mut cache = ReclaimableCache::with_pressure(pressure.clone());

    for key in 0..100u32 {
        cache.get_or_compute(key % 17, |k| Ok::<_, ()>(vec![*k; 8])).unwrap();
        assert!(pressure.softly_reachable() <= budget);
    }
}

#[test]
fn budget_policy_prefers_recently_touched() {
    let pressure = MemoryPressure::with_policy(LeastRecentlyTouched::new(2));
    let mut cache = ReclaimableCache::with_pressure(pressure.clone());

    cache.get_or_compute("a", |_| Ok::<_, ()>(1)).unwrap();
    cache.get_or_compute("b", |_| Ok::<_, ()>(2)).unwrap();
    // touching "a" makes "b" the stalest
    cache.get_or_compute("a", |_| Ok::<_, ()>(0)).unwrap();
    cache.get_or_compute("c", |_| Ok::<_, ()>(3)).unwrap();

    assert!(cache.contains(&"a"));
    assert!(!cache.contains(&"b"));
    assert!(cache.contains(&"c"));
}

#[test]
fn random_policy_is_reproducible() {
    fn survivors(seed: u64) -> Vec<u32> {
        let policy = RandomReclaim::try_new(0.5, seed).unwrap();
        let pressure = MemoryPressure::with_policy(policy);
        let mut cache = ReclaimableCache::with_pressure(pressure.clone());
        for key in 0..64u32 {
            cache.get_or_compute(key, |k| Ok::<_, ()>(*k)).unwrap();
        }
        pressure.reclaim();
        let mut alive: Vec<u32> = (0..64).filter(|k| cache.contains(k)).collect();
        alive.sort_unstable();
        alive
    }

    assert_eq!(survivors(9), survivors(9));
}

#[test]
fn channel_sink_receives_notices_on_another_thread() {
    init_tracing();
    let (tx, rx) = mpsc::channel();
    let pressure = MemoryPressure::new();
    let mut cache = ReclaimableCache::with_pressure(pressure.clone()).with_sink(tx);

    let listener = thread::spawn(move || rx.iter().map(|n| n.key).collect::<Vec<String>>());

    cache.get_or_compute("x".to_string(), |k| Ok::<_, ()>(k.len())).unwrap();
    pressure.reclaim();
    cache.get_or_compute("y".to_string(), |k| Ok::<_, ()>(k.len())).unwrap();
    drop(cache);

    assert_eq!(listener.join().unwrap(), vec!["x".to_string()]);
}

#[test]
fn signal_from_other_thread_between_calls() {
    let pressure = MemoryPressure::new();
    let mut cache = ReclaimableCache::with_pressure(pressure.clone());
    let value = cache.get_or_compute(1u8, |_| Ok::<_, ()>(Arc::new(5u8))).unwrap();
    drop(value);

    let remote = pressure.clone();
    assert_eq!(thread::spawn(move || remote.reclaim()).join().unwrap(), 1);

    let mut recomputed = false;
    cache
        .get_or_compute(1u8, |_| {
            recomputed = true;
            Ok::<_, ()>(Arc::new(6u8))
        })
        .unwrap();
    assert!(recomputed);
}
