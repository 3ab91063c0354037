#![no_main]

use libfuzzer_sys::fuzz_target;
use memokit::ds::HitLedger;

// Fuzz arbitrary operation sequences on HitLedger
//
// Tests random sequences of admit, record_hit, forget, pop_loser and compact,
// checking that pop_loser always agrees with peek_loser.
fuzz_target!(|data: &[u8]| {
    let mut ledger: HitLedger<u8> = HitLedger::new();

    for pair in data.chunks_exact(2) {
        let (op, key) = (pair[0] % 5, pair[1] % 24);
        match op {
            0 => {
                if ledger.rank_of(&key).is_none() {
                    let rank = ledger.admit(key);
                    assert_eq!(rank.hits, 1);
                }
            }
            1 => {
                let before = ledger.hits(&key);
                let after = ledger.record_hit(&key);
                assert_eq!(after, before.map(|h| h + 1));
            }
            2 => {
                let len = ledger.len();
                if ledger.forget(&key).is_some() {
                    assert_eq!(ledger.len(), len - 1);
                }
            }
            3 => {
                let peeked = ledger.peek_loser().map(|(k, r)| (*k, r));
                assert_eq!(ledger.pop_loser(), peeked);
            }
            _ => {
                let len = ledger.len();
                ledger.compact();
                assert_eq!(ledger.heap_len(), len);
            }
        }
        assert!(ledger.check_invariants().is_ok());
    }
});
