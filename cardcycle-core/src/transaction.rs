//! Transaction records as handed over by the ingestion layer.
//!
//! The core does not validate these; it only reads `(card, date)` to place a
//! record inside a cycle window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of mapping a payment-mode string to a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardMatch {
    Matched(String),
    /// No card recognised; excluded from every card-specific view.
    Unmapped,
}

impl CardMatch {
    pub fn card(&self) -> Option<&str> {
        match self {
            CardMatch::Matched(id) => Some(id),
            CardMatch::Unmapped => None,
        }
    }

    pub fn is_card(&self, id: &str) -> bool {
        self.card() == Some(id)
    }

    pub fn is_unmapped(&self) -> bool {
        matches!(self, CardMatch::Unmapped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
    Payment,
    Credit,
    Refund,
    Transfer,
    /// Tag outside the known set, kept verbatim.
    Other(String),
}

impl TransactionKind {
    /// Case-insensitive mapping of the `type` column.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "expense" => TransactionKind::Expense,
            "income" => TransactionKind::Income,
            "payment" => TransactionKind::Payment,
            "credit" => TransactionKind::Credit,
            "refund" => TransactionKind::Refund,
            "transfer" => TransactionKind::Transfer,
            _ => TransactionKind::Other(tag.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    /// Positive = charge
    pub amount: f64,
    pub card: CardMatch,
    pub kind: TransactionKind,
    pub description: String,
}

impl TransactionRecord {
    pub fn new(
        date: NaiveDate,
        amount: f64,
        card: CardMatch,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            card,
            kind,
            description: description.into(),
        }
    }

    /// Counts toward a card's cycle liability: a positive expense.
    pub fn is_charge(&self) -> bool {
        self.kind == TransactionKind::Expense && self.amount > 0.0
    }
}
