mod extractor;

pub use extractor::NotificationParser;

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use shared_types::{Currency, NotificationFormat, ParseError, TransactionRecord};
use std::str::FromStr;

/// Bank label for "paid by" notifications, which only name the pay channel
const PAID_BY_BANK: &str = "ABA";
/// Bank and transport label for "received" notifications
const RECEIVED_CHANNEL: &str = "ACLEDA";

type ExtractFn =
    fn(NotificationFormat, &Captures<'_>, &str) -> Result<TransactionRecord, ParseError>;

/// One recognized notification shape and the function that reads its captures
pub struct NotificationPattern {
    pub format: NotificationFormat,
    pub regex: Regex,
    extract: ExtractFn,
}

impl NotificationPattern {
    /// Matches `normalized` against this shape. `None` means the shape does not
    /// apply; `Some(Err(..))` means it applied but a field was unusable.
    pub fn extract(
        &self,
        normalized: &str,
        raw_text: &str,
    ) -> Option<Result<TransactionRecord, ParseError>> {
        let captures = self.regex.captures(normalized)?;
        Some((self.extract)(self.format, &captures, raw_text))
    }
}

/// Largest amount accepted from a notification, in whole currency units
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000_000;
/// Amounts carry at most cents
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Strips thousands separators and parses a non-negative amount of at most
/// two decimal places and at most `MAX_AMOUNT_UNITS`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    let amount = Decimal::from_str(cleaned.trim()).ok()?;
    if amount.is_sign_negative()
        || amount.normalize().scale() > MAX_AMOUNT_SCALE
        || amount > Decimal::from(MAX_AMOUNT_UNITS)
    {
        return None;
    }
    Some(amount)
}

fn field(captures: &Captures<'_>, name: &str) -> Option<String> {
    captures
        .name(name)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(
    format: NotificationFormat,
    captures: &Captures<'_>,
    name: &'static str,
) -> Result<String, ParseError> {
    field(captures, name).ok_or_else(|| ParseError::FieldParse {
        format,
        field: name,
        value: String::new(),
    })
}

fn currency_and_amount(
    format: NotificationFormat,
    captures: &Captures<'_>,
) -> Result<(Currency, Decimal), ParseError> {
    let symbol = required(format, captures, "currency")?;
    let currency = symbol
        .parse::<Currency>()
        .map_err(|_| ParseError::FieldParse {
            format,
            field: "currency",
            value: symbol.clone(),
        })?;

    let raw_amount = captures.name("amount").map(|m| m.as_str()).unwrap_or("");
    let amount = parse_amount(raw_amount).ok_or_else(|| ParseError::FieldParse {
        format,
        field: "amount",
        value: raw_amount.to_string(),
    })?;

    Ok((currency, amount))
}

fn extract_paid_by(
    format: NotificationFormat,
    captures: &Captures<'_>,
    raw_text: &str,
) -> Result<TransactionRecord, ParseError> {
    let (currency, amount) = currency_and_amount(format, captures)?;

    Ok(TransactionRecord {
        currency,
        amount,
        sender: required(format, captures, "sender")?,
        receiver: field(captures, "receiver"),
        transport: required(format, captures, "via")?,
        bank: PAID_BY_BANK.to_string(),
        trx_id: field(captures, "trx"),
        apv: field(captures, "apv"),
        occurred_on: required(format, captures, "date")?,
        raw_text: raw_text.to_string(),
        format,
    })
}

fn extract_received(
    format: NotificationFormat,
    captures: &Captures<'_>,
    raw_text: &str,
) -> Result<TransactionRecord, ParseError> {
    let (currency, amount) = currency_and_amount(format, captures)?;

    // Only a reference number is printed; it is kept as the approval code.
    Ok(TransactionRecord {
        currency,
        amount,
        sender: required(format, captures, "sender")?,
        receiver: field(captures, "receiver"),
        transport: RECEIVED_CHANNEL.to_string(),
        bank: RECEIVED_CHANNEL.to_string(),
        trx_id: None,
        apv: field(captures, "reference"),
        occurred_on: required(format, captures, "date")?,
        raw_text: raw_text.to_string(),
        format,
    })
}

fn extract_scan(
    format: NotificationFormat,
    captures: &Captures<'_>,
    raw_text: &str,
) -> Result<TransactionRecord, ParseError> {
    let (currency, amount) = currency_and_amount(format, captures)?;
    let hash = field(captures, "hash");

    Ok(TransactionRecord {
        currency,
        amount,
        sender: required(format, captures, "sender")?,
        receiver: None,
        transport: required(format, captures, "via")?,
        bank: required(format, captures, "bank")?,
        apv: hash.clone(),
        trx_id: hash,
        occurred_on: required(format, captures, "date")?,
        raw_text: raw_text.to_string(),
        format,
    })
}

/// Builds the pattern table in match priority order.
pub fn create_notification_patterns() -> Result<Vec<NotificationPattern>, regex::Error> {
    Ok(vec![
        // $3.00 paid by JOHN DOE (*1234) on 01-Jan-2025 via ABA PAY at RECEIVER CO.
        // Trx. ID: 1001, APV: 2002.
        NotificationPattern {
            format: NotificationFormat::PaidBy,
            regex: Regex::new(concat!(
                r"^(?P<currency>[$៛])(?P<amount>[\d,]+(?:\.\d+)?) paid by (?P<sender>.+?)",
                r"(?: \(\*\d+\))? on (?P<date>.+?) via (?P<via>.+?) at (?P<receiver>.+?)\.",
                r" Trx\. ID: (?P<trx>\w+), APV: (?P<apv>\w+)\.?$"
            ))?,
            extract: extract_paid_by,
        },
        // Received ៛25,000 from SOK DARA (012 345 678) on 15/07/2025 10:30AM.
        // Ref. No: 77881. To: MY SHOP.
        NotificationPattern {
            format: NotificationFormat::ReceivedLocal,
            regex: Regex::new(concat!(
                r"^Received (?P<currency>៛)(?P<amount>[\d,]+) from (?P<sender>.+?)",
                r" on (?P<date>.+?)\. Ref\. No: (?P<reference>\w+)\. To: (?P<receiver>.+?)\.?$"
            ))?,
            extract: extract_received,
        },
        // Received $12.50 from SOK DARA (012 345 678) on 15/07/2025 10:30AM.
        // Ref. No: 77882. To: MY SHOP.
        NotificationPattern {
            format: NotificationFormat::ReceivedForeign,
            regex: Regex::new(concat!(
                r"^Received (?P<currency>\$)(?P<amount>\d+(?:\.\d{1,2})?) from (?P<sender>.+?)",
                r" on (?P<date>.+?)\. Ref\. No: (?P<reference>\w+)\. To: (?P<receiver>.+?)\.?$"
            ))?,
            extract: extract_received,
        },
        // ៛40,000 received from CHAN SOPHEA, Wing Bank via KHQR at 15-07-2025 11:02
        // (Hash. 7a9f3c21)
        NotificationPattern {
            format: NotificationFormat::ScanLocal,
            regex: Regex::new(concat!(
                r"^(?P<currency>៛)(?P<amount>[\d,]+) received from (?P<sender>.+?),",
                r" (?P<bank>.+?) via (?P<via>.+?) at (?P<date>.+?)",
                r" \(Hash\. (?P<hash>[0-9A-Za-z]+)\)\.?$"
            ))?,
            extract: extract_scan,
        },
        // $7.25 received from CHAN SOPHEA, Wing Bank via KHQR at 15-07-2025 11:02 (Hash. 7a9f3c22)
        NotificationPattern {
            format: NotificationFormat::ScanForeign,
            regex: Regex::new(concat!(
                r"^(?P<currency>\$)(?P<amount>\d+(?:\.\d{1,2})?) received from (?P<sender>.+?),",
                r" (?P<bank>.+?) via (?P<via>.+?) at (?P<date>.+?)",
                r" \(Hash\. (?P<hash>[0-9A-Za-z]+)\)\.?$"
            ))?,
            extract: extract_scan,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_is_comma_agnostic() {
        assert_eq!(parse_amount("25,000"), Some(Decimal::from(25000)));
        assert_eq!(parse_amount("25000"), Some(Decimal::from(25000)));
        assert_eq!(parse_amount("1,234.50"), Some(Decimal::new(123450, 2)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(",,,"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-5"), None);
    }

    #[test]
    fn test_parse_amount_rejects_sub_cent_precision() {
        assert_eq!(parse_amount("3.005"), None);
        assert_eq!(parse_amount("3.50"), Some(Decimal::new(350, 2)));
        // trailing zeros do not count as precision
        assert_eq!(parse_amount("3.000"), Some(Decimal::from(3)));
    }

    #[test]
    fn test_parse_amount_rejects_oversized_values() {
        assert_eq!(parse_amount("1,000,000,000,000,000"), Some(Decimal::from(MAX_AMOUNT_UNITS)));
        assert_eq!(parse_amount("1,000,000,000,000,001"), None);
        assert_eq!(parse_amount("9,999,999,999,999,999,999,999,999,999"), None);
        assert_eq!(parse_amount("99999999999999999999999999999999999999"), None);
    }

    #[test]
    fn test_table_order_is_fixed() {
        let formats: Vec<_> = create_notification_patterns()
            .unwrap()
            .into_iter()
            .map(|p| p.format)
            .collect();
        assert_eq!(
            formats,
            vec![
                NotificationFormat::PaidBy,
                NotificationFormat::ReceivedLocal,
                NotificationFormat::ReceivedForeign,
                NotificationFormat::ScanLocal,
                NotificationFormat::ScanForeign,
            ]
        );
    }
}
