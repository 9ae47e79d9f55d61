use crate::transaction::Currency;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Secondary grouping axis for breakdown reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    Bank,
    Transport,
}

impl Dimension {
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Bank => "bank",
            Dimension::Transport => "transport",
        }
    }
}

/// Time window a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportWindow {
    /// One local calendar day in the reporting time zone
    AsOf(NaiveDate),
    /// Half-open UTC interval `[start, end)`
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Which stored transactions a report reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Chat the transactions were posted in
    pub group_id: i64,
    pub window: ReportWindow,
}

impl ReportFilter {
    pub fn as_of(group_id: i64, day: NaiveDate) -> Self {
        Self {
            group_id,
            window: ReportWindow::AsOf(day),
        }
    }

    pub fn between(group_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            group_id,
            window: ReportWindow::Between { start, end },
        }
    }
}

impl fmt::Display for ReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window {
            ReportWindow::AsOf(day) => write!(f, "group={} as_of={}", self.group_id, day),
            ReportWindow::Between { start, end } => write!(
                f,
                "group={} start={} end={}",
                self.group_id,
                start.to_rfc3339(),
                end.to_rfc3339()
            ),
        }
    }
}

/// Sum and count of one currency, optionally within one bank or transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub bank: Option<String>,
    pub transport: Option<String>,
    pub currency: Currency,
    pub total: Decimal,
    pub count: i64,
}

impl CurrencySummary {
    /// The value of the requested grouping axis, if this row carries one
    pub fn dimension_value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Bank => self.bank.as_deref(),
            Dimension::Transport => self.transport.as_deref(),
        }
    }
}

/// Totals-only result of the store, one pair per supported currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    pub usd_total: Decimal,
    pub usd_count: i64,
    pub khr_total: Decimal,
    pub khr_count: i64,
}

impl CurrencyTotals {
    pub fn get(&self, currency: Currency) -> (Decimal, i64) {
        match currency {
            Currency::Usd => (self.usd_total, self.usd_count),
            Currency::Khr => (self.khr_total, self.khr_count),
        }
    }
}

/// Report errors; each one maps to a fixed fallback reply
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unknown report kind: {0:?}")]
    UnknownReportKind(String),

    #[error("invalid date in report token: {0:?}")]
    InvalidDateToken(String),

    #[error("invalid report range: {0}")]
    InvalidRange(String),

    #[error("report query failed for {filter}: {message}")]
    StoreQuery { filter: String, message: String },
}
