//! Per-card, per-month cycle date overrides.
//!
//! An override pins the exact dates of one card's cycle for one month,
//! replacing the day-based computation. Precedence when resolving:
//! per-month override > card cycle definition.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::calendar::check_month;
use crate::cycle::CycleWindow;
use crate::error::{CycleError, Result};

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<year>\d{4})-(?P<month>\d{2})::(?P<card>.+)$").expect("override key pattern")
});

/// `(card, year, month)` identity of an override; text form `YYYY-MM::Card`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverrideKey {
    pub year: i32,
    pub month: u32,
    pub card: String,
}

impl OverrideKey {
    pub fn new(card: impl Into<String>, year: i32, month: u32) -> Result<Self> {
        check_month(month)?;
        Ok(Self {
            year,
            month,
            card: card.into(),
        })
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}::{}", self.year, self.month, self.card)
    }
}

impl FromStr for OverrideKey {
    type Err = CycleError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = KEY_RE
            .captures(s)
            .ok_or_else(|| CycleError::InvalidOverrideKey(s.to_string()))?;
        let year: i32 = caps["year"]
            .parse()
            .map_err(|_| CycleError::InvalidOverrideKey(s.to_string()))?;
        let month: u32 = caps["month"]
            .parse()
            .map_err(|_| CycleError::InvalidOverrideKey(s.to_string()))?;
        OverrideKey::new(&caps["card"], year, month)
    }
}

/// Pinned dates for one card-month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub due: NaiveDate,
}

impl OverrideDates {
    pub fn window(&self) -> CycleWindow {
        CycleWindow {
            cycle_start: self.start,
            cycle_end: self.end,
            statement_date: self.end,
            due_date: self.due,
        }
    }
}

/// Outcome of a JSON import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideBook {
    entries: BTreeMap<OverrideKey, OverrideDates>,
}

impl OverrideBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin dates for `key`, replacing any previous override.
    /// A start after the end is swapped rather than rejected.
    pub fn set(&mut self, key: OverrideKey, mut dates: OverrideDates) {
        if dates.start > dates.end {
            warn!(
                "override {key}: start {} after end {}; swapping",
                dates.start, dates.end
            );
            std::mem::swap(&mut dates.start, &mut dates.end);
        }
        self.entries.insert(key, dates);
    }

    pub fn get(&self, card: &str, year: i32, month: u32) -> Option<&OverrideDates> {
        self.entries.get(&OverrideKey {
            year,
            month,
            card: card.to_string(),
        })
    }

    pub fn remove(&mut self, key: &OverrideKey) -> Option<OverrideDates> {
        self.entries.remove(key)
    }

    /// Drop every override for `(year, month)`; returns how many were removed.
    pub fn clear_month(&mut self, year: i32, month: u32) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|k, _| !(k.year == year && k.month == month));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OverrideKey, &OverrideDates)> {
        self.entries.iter()
    }

    /// Merge a `{ "YYYY-MM::Card": {start, end, due} }` snapshot.
    /// Entries with a malformed key or dates are skipped and counted.
    pub fn import_json(&mut self, s: &str) -> Result<ImportReport> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(s).map_err(|e| CycleError::Config(e.to_string()))?;

        let mut report = ImportReport::default();
        for (key, value) in raw {
            let parsed = key
                .parse::<OverrideKey>()
                .and_then(|k| {
                    serde_json::from_value::<OverrideDates>(value)
                        .map(|d| (k, d))
                        .map_err(|e| CycleError::Config(e.to_string()))
                });
            match parsed {
                Ok((k, dates)) => {
                    self.set(k, dates);
                    report.imported += 1;
                }
                Err(e) => {
                    warn!("skipping override '{key}': {e}");
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }

    /// Export overrides, optionally only those of one `(year, month)`.
    pub fn export_json(&self, month: Option<(i32, u32)>) -> Result<String> {
        let raw: BTreeMap<String, &OverrideDates> = self
            .entries
            .iter()
            .filter(|(k, _)| month.is_none_or(|(y, m)| k.year == y && k.month == m))
            .map(|(k, d)| (k.to_string(), d))
            .collect();
        serde_json::to_string_pretty(&raw).map_err(|e| CycleError::Config(e.to_string()))
    }
}
