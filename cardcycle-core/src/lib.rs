//! cardcycle-core: billing-cycle windows for credit and debit cards.
//!
//! Given a card's cycle convention (start/end/due day, due offset) and a
//! calendar month, derive the window of the cycle that closes in that month
//! together with its statement and due dates.

pub mod calendar;
pub mod cycle;
pub mod error;
pub mod overrides;
pub mod registry;
pub mod resolver;
pub mod transaction;

pub use cycle::{CycleDefinition, CycleWindow};
pub use error::CycleError;
pub use overrides::{ImportReport, OverrideBook, OverrideDates, OverrideKey};
pub use registry::CycleRegistry;
pub use resolver::{CardCycle, CycleResolver};
pub use transaction::{CardMatch, TransactionKind, TransactionRecord};
