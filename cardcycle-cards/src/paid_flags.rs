//! Paid/unpaid toggles keyed by item and month.
//!
//! Pure presentation state: the resolver never reads it. The store is a trait
//! so a UI can back it with whatever it already persists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagKind {
    /// Regular cash outflow (rent, SIP, ...)
    Cash,
    /// Card bill
    Card,
}

impl FlagKind {
    fn prefix(self) -> &'static str {
        match self {
            FlagKind::Cash => "CASH",
            FlagKind::Card => "CC",
        }
    }
}

/// Composite key; text form `CASH::<item>::YYYY-MM` or `CC::<card>::YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagKey {
    pub kind: FlagKind,
    pub item: String,
    pub year: i32,
    pub month: u32,
}

impl FlagKey {
    pub fn cash(item: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            kind: FlagKind::Cash,
            item: item.into(),
            year,
            month,
        }
    }

    pub fn card(card: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            kind: FlagKind::Card,
            item: card.into(),
            year,
            month,
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{:04}-{:02}",
            self.kind.prefix(),
            self.item,
            self.year,
            self.month
        )
    }
}

pub trait PaidFlagStore {
    fn set(&mut self, key: &FlagKey, paid: bool);

    /// Unknown keys read as unpaid.
    fn is_paid(&self, key: &FlagKey) -> bool;

    fn clear(&mut self);

    fn toggle(&mut self, key: &FlagKey) -> bool {
        let paid = !self.is_paid(key);
        self.set(key, paid);
        paid
    }
}

/// In-memory store; serializes to the flat `{ "<key>": bool }` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryFlagStore {
    flags: BTreeMap<String, bool>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Merge a JSON snapshot; incoming keys overwrite existing ones.
    pub fn import_json(&mut self, s: &str) -> Result<usize, serde_json::Error> {
        let incoming: BTreeMap<String, bool> = serde_json::from_str(s)?;
        let n = incoming.len();
        self.flags.extend(incoming);
        Ok(n)
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.flags)
    }
}

impl PaidFlagStore for InMemoryFlagStore {
    fn set(&mut self, key: &FlagKey, paid: bool) {
        self.flags.insert(key.to_string(), paid);
    }

    fn is_paid(&self, key: &FlagKey) -> bool {
        self.flags.get(&key.to_string()).copied().unwrap_or(false)
    }

    fn clear(&mut self) {
        self.flags.clear();
    }
}
