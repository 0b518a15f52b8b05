//! cardcycle-cards: card identification rules, per-cycle statements and paid flags

pub mod card_rules;
pub mod paid_flags;
pub mod statement;

pub use card_rules::{CardError, CardMatcher, CardRule};
pub use paid_flags::{FlagKey, FlagKind, InMemoryFlagStore, PaidFlagStore};
pub use statement::CycleStatement;
