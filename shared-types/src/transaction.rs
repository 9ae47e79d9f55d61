use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies that appear in payment notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// US dollar, written `$`
    #[serde(rename = "$")]
    Usd,
    /// Cambodian riel, written `៛`
    #[serde(rename = "៛")]
    Khr,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Khr];

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Khr => "៛",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "$" | "USD" => Ok(Currency::Usd),
            "៛" | "KHR" => Ok(Currency::Khr),
            other => Err(format!("unknown currency: {other}")),
        }
    }
}

/// The notification shape a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationFormat {
    PaidBy,
    ReceivedLocal,
    ReceivedForeign,
    ScanLocal,
    ScanForeign,
}

impl NotificationFormat {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationFormat::PaidBy => "paid-by",
            NotificationFormat::ReceivedLocal => "received-local",
            NotificationFormat::ReceivedForeign => "received-foreign",
            NotificationFormat::ScanLocal => "scan-local",
            NotificationFormat::ScanForeign => "scan-foreign",
        }
    }
}

impl fmt::Display for NotificationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical payment record extracted from one notification message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub currency: Currency,
    /// Always non-negative
    pub amount: Decimal,
    /// Payer as printed by the source, may carry a phone number
    pub sender: String,
    pub receiver: Option<String>,
    /// Channel or scan method the payment went through
    pub transport: String,
    pub bank: String,
    pub trx_id: Option<String>,
    pub apv: Option<String>,
    /// Timestamp exactly as the source printed it
    pub occurred_on: String,
    pub raw_text: String,
    pub format: NotificationFormat,
}

/// Errors raised while turning notification text into a record
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("text matched no known notification format: {text:?}")]
    NoFormatMatch { text: String },

    #[error("{format} notification has unparsable {field}: {value:?}")]
    FieldParse {
        format: NotificationFormat,
        field: &'static str,
        value: String,
    },
}
