use crate::config::ReportingConfig;
use crate::reports::aggregator::ReportAggregator;
use crate::reports::callback::{ReportKind, ReportMenu, ReportRequest};
use crate::reports::date_range::DateRangeResolver;
use crate::reports::formatter::{escape_markdown, ReportFormatter};
use crate::storage::TransactionStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use shared_types::{Dimension, ReportError};
use std::sync::Arc;

pub const UNKNOWN_REPORT_TEXT: &str = "Unknown report type.";
pub const INVALID_DATE_TEXT: &str = "Invalid date format, expected DD_MM_YYYY.";
pub const REPORT_FAILED_TEXT: &str = "Could not build the report, please try again later.";

/// Fixed user-facing reply for a report error, unescaped
pub fn fallback_text(error: &ReportError) -> &'static str {
    match error {
        ReportError::UnknownReportKind(_) => UNKNOWN_REPORT_TEXT,
        ReportError::InvalidDateToken(_) => INVALID_DATE_TEXT,
        ReportError::StoreQuery { .. } | ReportError::InvalidRange(_) => REPORT_FAILED_TEXT,
    }
}

/// Turns report tokens into report text. Holds no per-chat state: the
/// token carries everything a report needs.
pub struct ReportController {
    resolver: DateRangeResolver,
    aggregator: ReportAggregator,
    recent_days: u32,
}

impl ReportController {
    pub fn new(store: Arc<dyn TransactionStore>, reporting: &ReportingConfig) -> Result<Self> {
        Ok(Self {
            resolver: DateRangeResolver::new(reporting.tz()?),
            aggregator: ReportAggregator::new(store),
            recent_days: reporting.recent_days,
        })
    }

    /// Escaped report body for a callback token pressed in `group_id`
    pub async fn handle_report_callback(
        &self,
        group_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ReportError> {
        let kind = ReportKind::from_token(token)?;
        let range = self.resolver.resolve(kind.period, now)?;
        let request = ReportRequest {
            kind,
            filter: range.to_filter(group_id),
        };

        tracing::debug!("Building report {} for {}", token, request.filter);

        let summaries = self
            .aggregator
            .summarize(&request.filter, request.kind.breakdown)
            .await?;

        Ok(ReportFormatter::format(
            &summaries,
            &range.label,
            request.kind.breakdown,
        ))
    }

    /// Like `handle_report_callback`, with errors turned into their escaped fallback text
    pub async fn reply_for_callback(
        &self,
        group_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> String {
        match self.handle_report_callback(group_id, token, now).await {
            Ok(text) => text,
            Err(e) => {
                match &e {
                    ReportError::UnknownReportKind(_) | ReportError::InvalidDateToken(_) => {
                        tracing::warn!("Rejected report token in chat {}: {}", group_id, e)
                    }
                    _ => tracing::error!("Report failed in chat {}: {}", group_id, e),
                }
                escape_markdown(fallback_text(&e))
            }
        }
    }

    /// Escaped prompt and buttons for choosing a report period
    pub fn report_menu(&self, dimension: Option<Dimension>, now: DateTime<Utc>) -> ReportMenu {
        let today = self.resolver.local_today(now);
        ReportMenu {
            text: escape_markdown(ReportMenu::prompt(dimension)),
            rows: ReportMenu::rows(dimension, today, self.recent_days),
        }
    }
}
