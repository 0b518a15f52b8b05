//! Cycle definitions (per-card static config) and the windows derived from them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{check_month, clamped_date, shift_month};
use crate::error::{CycleError, Result};

/// Billing-cycle convention of one card.
///
/// Days are bare day-of-month numbers; they are clamped per month when a
/// window is computed, so `31` means "last day of the month" in short months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCycleDefinition")]
pub struct CycleDefinition {
    /// Day of month the cycle opens
    pub start_day: u32,
    /// Day of month the cycle closes (statement generated)
    pub end_day: u32,
    /// Day of month payment is due
    pub due_day: u32,
    /// Months between the cycle-end month and the due month
    pub due_offset_months: u32,
}

#[derive(Deserialize)]
struct RawCycleDefinition {
    start_day: u32,
    end_day: u32,
    due_day: u32,
    due_offset_months: u32,
}

impl TryFrom<RawCycleDefinition> for CycleDefinition {
    type Error = CycleError;

    fn try_from(raw: RawCycleDefinition) -> Result<Self> {
        CycleDefinition::new(raw.start_day, raw.end_day, raw.due_day, raw.due_offset_months)
    }
}

fn check_day(field: &'static str, value: u32) -> Result<()> {
    if (1..=31).contains(&value) {
        Ok(())
    } else {
        Err(CycleError::InvalidDay { field, value })
    }
}

impl CycleDefinition {
    pub fn new(start_day: u32, end_day: u32, due_day: u32, due_offset_months: u32) -> Result<Self> {
        check_day("start_day", start_day)?;
        check_day("end_day", end_day)?;
        check_day("due_day", due_day)?;
        Ok(Self {
            start_day,
            end_day,
            due_day,
            due_offset_months,
        })
    }

    /// Cycle opens in the month before it closes (e.g. 22 -> 21).
    pub fn spans_month_boundary(&self) -> bool {
        self.start_day > self.end_day
    }

    /// Compute the window of the cycle that ends in `(year, month)`.
    ///
    /// With `due_offset_months == 0` and `due_day < end_day` the due date
    /// lands before the cycle end; that configuration is passed through as-is.
    pub fn window_ending_in(&self, year: i32, month: u32) -> Result<CycleWindow> {
        check_month(month)?;

        let cycle_end = clamped_date(year, month, self.end_day)?;

        let cycle_start = if self.spans_month_boundary() {
            let (y, m) = shift_month(year, month, -1)?;
            clamped_date(y, m, self.start_day)?
        } else {
            clamped_date(year, month, self.start_day)?
        };

        let offset = i32::try_from(self.due_offset_months)
            .map_err(|_| CycleError::DateOutOfRange { year, month })?;
        let (due_year, due_month) = shift_month(cycle_end.year(), cycle_end.month(), offset)?;
        let due_date = clamped_date(due_year, due_month, self.due_day)?;

        Ok(CycleWindow {
            cycle_start,
            cycle_end,
            statement_date: cycle_end,
            due_date,
        })
    }
}

/// Date window of a single billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWindow {
    pub cycle_start: NaiveDate,
    pub cycle_end: NaiveDate,
    /// Bill generation date; equals `cycle_end`.
    pub statement_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl CycleWindow {
    /// Inclusive membership test on `[cycle_start, cycle_end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.cycle_start <= date && date <= self.cycle_end
    }

    /// True when the due date falls in `(year, month)`.
    pub fn is_due_in(&self, year: i32, month: u32) -> bool {
        self.due_date.year() == year && self.due_date.month() == month
    }

    /// Length of the cycle in days, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.cycle_end - self.cycle_start).num_days() + 1
    }
}
