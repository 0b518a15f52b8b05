//! Cycle resolver: registry + per-month overrides.
//!
//! Stateless after construction; every call is a pure function of the
//! registry, the override book and its arguments.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::calendar::{check_month, clamped_date, shift_month};
use crate::cycle::CycleWindow;
use crate::error::{CycleError, Result};
use crate::overrides::OverrideBook;
use crate::registry::CycleRegistry;

/// How many months either side of the target the due-month search looks at.
const DUE_SEARCH_RADIUS: i32 = 2;

/// One card's cycle window in a multi-card listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardCycle {
    pub card: String,
    pub window: CycleWindow,
    /// True when the window came from a per-month override.
    pub overridden: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CycleResolver {
    registry: CycleRegistry,
    overrides: OverrideBook,
}

impl CycleResolver {
    pub fn new(registry: CycleRegistry) -> Self {
        Self {
            registry,
            overrides: OverrideBook::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideBook) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn registry(&self) -> &CycleRegistry {
        &self.registry
    }

    pub fn overrides(&self) -> &OverrideBook {
        &self.overrides
    }

    /// Window of the cycle that ends in `(year, month)`, from the card's
    /// definition only.
    pub fn resolve(&self, card_id: &str, year: i32, month: u32) -> Result<CycleWindow> {
        let window = self.registry.resolve(card_id, year, month)?;
        debug!(
            "{card_id} {year:04}-{month:02}: {} .. {} due {}",
            window.cycle_start, window.cycle_end, window.due_date
        );
        Ok(window)
    }

    /// Like [`CycleResolver::resolve`], but a per-month override wins when present.
    pub fn resolve_effective(&self, card_id: &str, year: i32, month: u32) -> Result<CardCycle> {
        if !self.registry.contains(card_id) {
            return Err(CycleError::UnknownCard(card_id.to_string()));
        }
        check_month(month)?;

        if let Some(dates) = self.overrides.get(card_id, year, month) {
            debug!("{card_id} {year:04}-{month:02}: using override");
            return Ok(CardCycle {
                card: card_id.to_string(),
                window: dates.window(),
                overridden: true,
            });
        }

        Ok(CardCycle {
            card: card_id.to_string(),
            window: self.resolve(card_id, year, month)?,
            overridden: false,
        })
    }

    /// Cycle whose due date falls in `(year, month)`.
    ///
    /// Tries the cycles ending two months either side of the target. If none is
    /// due in the target month (possible with overrides), returns the one due
    /// closest to the 15th of that month.
    pub fn resolve_due_in(&self, card_id: &str, year: i32, month: u32) -> Result<CardCycle> {
        check_month(month)?;
        let anchor = clamped_date(year, month, 15)?;

        let mut candidates = Vec::with_capacity((2 * DUE_SEARCH_RADIUS + 1) as usize);
        for delta in -DUE_SEARCH_RADIUS..=DUE_SEARCH_RADIUS {
            let (y, m) = shift_month(year, month, delta)?;
            let cycle = self.resolve_effective(card_id, y, m)?;
            if cycle.window.is_due_in(year, month) {
                return Ok(cycle);
            }
            candidates.push(cycle);
        }

        candidates
            .into_iter()
            .min_by_key(|c| distance_days(c.window.due_date, anchor))
            .ok_or_else(|| CycleError::UnknownCard(card_id.to_string()))
    }

    /// Every card's cycle ending in `(year, month)`, ordered by due date.
    pub fn statements_generated_in(&self, year: i32, month: u32) -> Result<Vec<CardCycle>> {
        let mut out = self
            .registry
            .card_ids()
            .map(|id| self.resolve_effective(id, year, month))
            .collect::<Result<Vec<_>>>()?;
        sort_by_due(&mut out);
        Ok(out)
    }

    /// Every card's cycle due in `(year, month)`, ordered by due date.
    pub fn statements_due_in(&self, year: i32, month: u32) -> Result<Vec<CardCycle>> {
        let mut out = self
            .registry
            .card_ids()
            .map(|id| self.resolve_due_in(id, year, month))
            .collect::<Result<Vec<_>>>()?;
        sort_by_due(&mut out);
        Ok(out)
    }
}

fn distance_days(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

fn sort_by_due(cycles: &mut [CardCycle]) {
    cycles.sort_by(|a, b| {
        a.window
            .due_date
            .cmp(&b.window.due_date)
            .then_with(|| a.card.cmp(&b.card))
    });
}
