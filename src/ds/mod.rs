pub mod hit_ledger;

pub use hit_ledger::{HitLedger, Rank};
