//! Error kinds surfaced by the cycle resolver and registry builders.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// Card id is not a registry key.
    #[error("unknown card: {0}")]
    UnknownCard(String),

    /// Month outside 1-12.
    #[error("invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    /// A day-of-month field outside 1-31.
    #[error("invalid {field}: {value} (expected 1-31)")]
    InvalidDay { field: &'static str, value: u32 },

    #[error("duplicate card id: {0}")]
    DuplicateCard(String),

    #[error("card id must not be empty")]
    EmptyCardId,

    /// Year outside what the calendar can represent.
    #[error("date out of range: {year:04}-{month:02}")]
    DateOutOfRange { year: i32, month: u32 },

    #[error("invalid override key '{0}' (expected YYYY-MM::Card)")]
    InvalidOverrideKey(String),

    #[error("invalid cycle config: {0}")]
    Config(String),
}

pub type Result<T, E = CycleError> = std::result::Result<T, E>;
