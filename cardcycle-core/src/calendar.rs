//! Calendar month arithmetic with day-of-month clamping.
//!
//! Cards define boundaries as bare day numbers (e.g. 31) that do not exist in
//! every month. Dates built here clamp to the month's last day instead of
//! failing.

use chrono::{Datelike, NaiveDate};

use crate::error::{CycleError, Result};

/// Reject months outside 1-12.
pub fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(CycleError::InvalidMonth(month))
    }
}

/// Number of days in `(year, month)`.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    check_month(month)?;
    let (next_year, next_month) = shift_month(year, month, 1)?;
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .ok_or(CycleError::DateOutOfRange { year, month })
}

/// Build `(year, month, day)` with `day` clamped into `1..=days_in_month`.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
        .ok_or(CycleError::DateOutOfRange { year, month })
}

/// Move `(year, month)` by `delta` months, rolling the year as needed.
/// `month` is assumed to be 1-12. Fails with `DateOutOfRange` when the month
/// index leaves `i32`.
pub fn shift_month(year: i32, month: u32, delta: i32) -> Result<(i32, u32)> {
    let index = year
        .checked_mul(12)
        .and_then(|i| i.checked_add(month as i32 - 1))
        .and_then(|i| i.checked_add(delta))
        .ok_or(CycleError::DateOutOfRange { year, month })?;
    Ok((index.div_euclid(12), index.rem_euclid(12) as u32 + 1))
}
