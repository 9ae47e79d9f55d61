use rust_decimal::Decimal;
use shared_types::{Currency, CurrencySummary, CurrencyTotals, Dimension};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Characters Telegram MarkdownV2 reserves outside entities
pub const MARKDOWN_RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

const BLOCK_SEPARATOR: &str = "──────────";
const UNKNOWN_VALUE: &str = "Unknown";

/// Backslash-prefix every reserved character in one pass
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if MARKDOWN_RESERVED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn add(totals: &mut CurrencyTotals, summary: &CurrencySummary) {
    match summary.currency {
        Currency::Usd => {
            totals.usd_total += summary.total;
            totals.usd_count += summary.count;
        }
        Currency::Khr => {
            totals.khr_total += summary.total;
            totals.khr_count += summary.count;
        }
    }
}

fn currency_line(out: &mut String, currency: Currency, total: Decimal, count: i64) {
    let _ = writeln!(out, "{}: {:.2} | {}", currency.symbol(), total, count);
}

fn transaction_count(count: i64) -> String {
    match count {
        1 => "1 transaction".to_string(),
        n => format!("{n} transactions"),
    }
}

fn currency_lines(out: &mut String, totals: &CurrencyTotals) {
    for currency in Currency::ALL {
        let (total, count) = totals.get(currency);
        currency_line(out, currency, total, count);
    }
}

pub struct ReportFormatter;

impl ReportFormatter {
    /// Render a report as MarkdownV2 text
    pub fn format(
        summaries: &[CurrencySummary],
        label: &str,
        dimension: Option<Dimension>,
    ) -> String {
        escape_markdown(&Self::compose(summaries, label, dimension))
    }

    /// The unescaped report text
    pub fn compose(
        summaries: &[CurrencySummary],
        label: &str,
        dimension: Option<Dimension>,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 {label}");

        match dimension {
            None => {
                let mut totals = CurrencyTotals::default();
                for summary in summaries {
                    add(&mut totals, summary);
                }
                currency_lines(&mut out, &totals);
            }
            Some(dimension) => {
                let heading = match dimension {
                    Dimension::Bank => "By bank",
                    Dimension::Transport => "By transport",
                };
                let _ = writeln!(out, "{heading}");

                let mut blocks: BTreeMap<&str, CurrencyTotals> = BTreeMap::new();
                for summary in summaries {
                    let value = summary.dimension_value(dimension).unwrap_or(UNKNOWN_VALUE);
                    add(blocks.entry(value).or_default(), summary);
                }

                if blocks.is_empty() {
                    let _ = writeln!(out, "No transactions");
                }

                for (index, (value, totals)) in blocks.iter().enumerate() {
                    if index > 0 {
                        let _ = writeln!(out, "{BLOCK_SEPARATOR}");
                    }
                    let count = transaction_count(totals.usd_count + totals.khr_count);
                    let _ = writeln!(out, "{value} ({count})");
                    currency_lines(&mut out, totals);
                }
            }
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out
    }
}
