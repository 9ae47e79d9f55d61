use crate::notification_patterns::{create_notification_patterns, NotificationPattern};
use shared_types::{NotificationFormat, ParseError, TransactionRecord};

/// Ordered, precompiled set of notification shapes. Build it once and share it.
pub struct NotificationParser {
    patterns: Vec<NotificationPattern>,
}

impl NotificationParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: create_notification_patterns()?,
        })
    }

    /// Formats in the order they are tried.
    pub fn formats(&self) -> Vec<NotificationFormat> {
        self.patterns.iter().map(|p| p.format).collect()
    }

    /// Parses one notification message. The first shape that matches decides
    /// the outcome; later shapes are not consulted.
    pub fn parse(&self, text: &str) -> Result<TransactionRecord, ParseError> {
        let normalized = normalize_whitespace(text);

        if !normalized.is_empty() {
            for pattern in &self.patterns {
                if let Some(result) = pattern.extract(&normalized, text) {
                    return result;
                }
            }
        }

        Err(ParseError::NoFormatMatch {
            text: text.to_string(),
        })
    }
}

/// Collapses line breaks and repeated spaces so multi-line notifications
/// match the single-line shapes.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared_types::Currency;

    fn parser() -> NotificationParser {
        NotificationParser::new().unwrap()
    }

    #[test]
    fn test_paid_by() {
        let text = "$3.00 paid by JOHN DOE (*1234) on 01-Jan-2025 via ABA PAY at RECEIVER CO. \
                    Trx. ID: 1001, APV: 2002.";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.format, NotificationFormat::PaidBy);
        assert_eq!(record.currency, Currency::Usd);
        assert_eq!(record.amount, Decimal::new(300, 2));
        assert_eq!(record.sender, "JOHN DOE");
        assert_eq!(record.transport, "ABA PAY");
        assert_eq!(record.receiver, Some("RECEIVER CO".to_string()));
        assert_eq!(record.trx_id, Some("1001".to_string()));
        assert_eq!(record.apv, Some("2002".to_string()));
        assert_eq!(record.bank, "ABA");
        assert_eq!(record.occurred_on, "01-Jan-2025");
        assert_eq!(record.raw_text, text);
    }

    #[test]
    fn test_paid_by_riel_without_card_suffix() {
        let text = "៛12,500 paid by SOK DARA on 02-Feb-2025 10:15AM via ABA KHQR at NOODLE HOUSE. \
                    Trx. ID: 555, APV: 666.";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.currency, Currency::Khr);
        assert_eq!(record.amount, Decimal::from(12500));
        assert_eq!(record.sender, "SOK DARA");
        assert_eq!(record.occurred_on, "02-Feb-2025 10:15AM");
        assert_eq!(record.transport, "ABA KHQR");
    }

    #[test]
    fn test_received_local() {
        let text = "Received ៛25,000 from SOK DARA (012 345 678) on 15/07/2025 10:30AM. \
                    Ref. No: 77881. To: MY SHOP.";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.format, NotificationFormat::ReceivedLocal);
        assert_eq!(record.currency, Currency::Khr);
        assert_eq!(record.amount, Decimal::from(25000));
        assert_eq!(record.sender, "SOK DARA (012 345 678)");
        assert_eq!(record.receiver, Some("MY SHOP".to_string()));
        assert_eq!(record.bank, "ACLEDA");
        assert_eq!(record.transport, "ACLEDA");
        assert_eq!(record.trx_id, None);
        assert_eq!(record.apv, Some("77881".to_string()));
        assert_eq!(record.occurred_on, "15/07/2025 10:30AM");
    }

    #[test]
    fn test_received_foreign() {
        let text = "Received $12.50 from SOK DARA (012 345 678) on 15/07/2025 10:31AM. \
                    Ref. No: 77882. To: MY SHOP.";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.format, NotificationFormat::ReceivedForeign);
        assert_eq!(record.currency, Currency::Usd);
        assert_eq!(record.amount, Decimal::new(1250, 2));
        assert_eq!(record.bank, "ACLEDA");
        assert_eq!(record.transport, "ACLEDA");
        assert_eq!(record.trx_id, None);
        assert_eq!(record.apv, Some("77882".to_string()));
    }

    #[test]
    fn test_scan_local() {
        let text = "៛40,000 received from CHAN SOPHEA, Wing Bank via KHQR at 15-07-2025 11:02 \
                    (Hash. 7a9f3c21)";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.format, NotificationFormat::ScanLocal);
        assert_eq!(record.currency, Currency::Khr);
        assert_eq!(record.amount, Decimal::from(40000));
        assert_eq!(record.sender, "CHAN SOPHEA");
        assert_eq!(record.bank, "Wing Bank");
        assert_eq!(record.transport, "KHQR");
        assert_eq!(record.trx_id, Some("7a9f3c21".to_string()));
        assert_eq!(record.apv, record.trx_id);
        assert_eq!(record.receiver, None);
        assert_eq!(record.occurred_on, "15-07-2025 11:02");
    }

    #[test]
    fn test_scan_foreign() {
        let text = "$7.25 received from CHAN SOPHEA, ACLEDA Bank Plc. via KHQR at 15-07-2025 11:05 \
                    (Hash. 7a9f3c22)";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.format, NotificationFormat::ScanForeign);
        assert_eq!(record.currency, Currency::Usd);
        assert_eq!(record.amount, Decimal::new(725, 2));
        assert_eq!(record.bank, "ACLEDA Bank Plc.");
        assert_eq!(record.transport, "KHQR");
        assert_eq!(record.apv, Some("7a9f3c22".to_string()));
    }

    #[test]
    fn test_multiline_notification_is_normalized() {
        let text = "Received ៛25,000 from SOK DARA\n on 15/07/2025 10:30AM.\n\
                    Ref. No: 1.\nTo: MY SHOP";
        let record = parser().parse(text).unwrap();

        assert_eq!(record.format, NotificationFormat::ReceivedLocal);
        assert_eq!(record.receiver, Some("MY SHOP".to_string()));
        assert_eq!(record.raw_text, text);
    }

    #[test]
    fn test_amount_is_comma_agnostic() {
        let with_commas = "Received ៛25,000 from A on 1/1/2025. Ref. No: 1. To: B";
        let without = "Received ៛25000 from A on 1/1/2025. Ref. No: 1. To: B";

        let a = parser().parse(with_commas).unwrap();
        let b = parser().parse(without).unwrap();
        assert_eq!(a.amount, Decimal::from(25000));
        assert_eq!(a.amount, b.amount);
    }

    #[test]
    fn test_no_format_match() {
        let err = parser().parse("hello, is the shop open today?").unwrap_err();
        match err {
            ParseError::NoFormatMatch { text } => {
                assert_eq!(text, "hello, is the shop open today?")
            }
            other => panic!("expected NoFormatMatch, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_text_is_no_match() {
        assert!(matches!(
            parser().parse(""),
            Err(ParseError::NoFormatMatch { .. })
        ));
        assert!(matches!(
            parser().parse("   \n "),
            Err(ParseError::NoFormatMatch { .. })
        ));
    }

    #[test]
    fn test_unparsable_amount_is_field_error() {
        let text = "Received ៛,,, from SOK DARA on 15/07/2025. Ref. No: 9. To: MY SHOP";
        match parser().parse(text) {
            Err(ParseError::FieldParse {
                format,
                field,
                value,
            }) => {
                assert_eq!(format, NotificationFormat::ReceivedLocal);
                assert_eq!(field, "amount");
                assert_eq!(value, ",,,");
            }
            other => panic!("expected FieldParse, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_cent_amount_is_field_error() {
        let text = "$3.005 paid by JOHN DOE on 01-Jan-2025 via ABA PAY at SHOP. \
                    Trx. ID: 1, APV: 2.";
        assert!(matches!(
            parser().parse(text),
            Err(ParseError::FieldParse {
                format: NotificationFormat::PaidBy,
                field: "amount",
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_amount_is_field_error() {
        let text = "Received ៛9,999,999,999,999,999,999,999,999,999 from A on 1/1/2025. \
                    Ref. No: 1. To: B";
        match parser().parse(text) {
            Err(ParseError::FieldParse { field, value, .. }) => {
                assert_eq!(field, "amount");
                assert_eq!(value, "9,999,999,999,999,999,999,999,999,999");
            }
            other => panic!("expected FieldParse, got {other:?}"),
        }
    }

    #[test]
    fn test_formats_listed_in_priority_order() {
        let formats = parser().formats();
        assert_eq!(formats.first(), Some(&NotificationFormat::PaidBy));
        assert_eq!(formats.len(), 5);
    }
}
