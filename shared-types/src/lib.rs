//! Shared data model for the PayTally workspace: parsed payment records,
//! report filters and summaries, and the error taxonomy used across crates.

pub mod report;
pub mod transaction;

pub use report::{
    CurrencySummary, CurrencyTotals, Dimension, ReportError, ReportFilter, ReportWindow,
};
pub use transaction::{Currency, NotificationFormat, ParseError, TransactionRecord};
