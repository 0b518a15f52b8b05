//! Per-cycle statements: the charges of one card that fall inside one cycle window.

use cardcycle_core::{CardCycle, CycleResolver, CycleWindow, TransactionRecord};
use cardcycle_core::error::Result;

/// Charges of `card` inside `window`, oldest first.
#[derive(Debug, Clone)]
pub struct CycleStatement<'a> {
    pub card: String,
    pub window: CycleWindow,
    pub charges: Vec<&'a TransactionRecord>,
}

impl<'a> CycleStatement<'a> {
    /// Select the positive expenses mapped to `card` and dated inside the
    /// window. Unmapped records never match any card.
    pub fn collect(card: &str, window: CycleWindow, records: &'a [TransactionRecord]) -> Self {
        let mut charges: Vec<&TransactionRecord> = records
            .iter()
            .filter(|r| r.card.is_card(card) && r.is_charge() && window.contains(r.date))
            .collect();
        charges.sort_by_key(|r| r.date);

        Self {
            card: card.to_string(),
            window,
            charges,
        }
    }

    pub fn from_cycle(cycle: &CardCycle, records: &'a [TransactionRecord]) -> Self {
        Self::collect(&cycle.card, cycle.window, records)
    }

    /// Sum of charges, rounded to cents.
    pub fn total(&self) -> f64 {
        let sum: f64 = self.charges.iter().map(|r| r.amount).sum();
        (sum * 100.0).round() / 100.0
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }
}

/// Statements for every card whose cycle closes in `(year, month)`.
pub fn statements_generated_in<'a>(
    resolver: &CycleResolver,
    records: &'a [TransactionRecord],
    year: i32,
    month: u32,
) -> Result<Vec<CycleStatement<'a>>> {
    Ok(resolver
        .statements_generated_in(year, month)?
        .iter()
        .map(|c| CycleStatement::from_cycle(c, records))
        .collect())
}

/// Statements for every card whose bill is due in `(year, month)`.
pub fn statements_due_in<'a>(
    resolver: &CycleResolver,
    records: &'a [TransactionRecord],
    year: i32,
    month: u32,
) -> Result<Vec<CycleStatement<'a>>> {
    Ok(resolver
        .statements_due_in(year, month)?
        .iter()
        .map(|c| CycleStatement::from_cycle(c, records))
        .collect())
}
