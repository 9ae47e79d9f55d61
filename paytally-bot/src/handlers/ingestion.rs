use crate::storage::{NewTransaction, TransactionStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use extractors::NotificationParser;
use shared_types::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Row id of the stored transaction
    Stored(i64),
    /// Not a payment notification, or a malformed one
    Skipped,
}

/// Parse one chat message and store it when it is a payment notification.
/// Parse failures are logged and skipped; only store failures are errors.
pub async fn ingest_text(
    parser: &NotificationParser,
    store: &dyn TransactionStore,
    bot_name: &str,
    chat_id: i64,
    text: &str,
    received_at: DateTime<Utc>,
) -> Result<IngestOutcome> {
    let record = match parser.parse(text) {
        Ok(record) => record,
        Err(ParseError::NoFormatMatch { .. }) => {
            tracing::debug!(
                "[{}] No notification format matched in chat {}",
                bot_name,
                chat_id
            );
            return Ok(IngestOutcome::Skipped);
        }
        Err(e @ ParseError::FieldParse { .. }) => {
            tracing::warn!(
                "[{}] Skipping message in chat {}: {} (raw: {:?})",
                bot_name,
                chat_id,
                e,
                text
            );
            return Ok(IngestOutcome::Skipped);
        }
    };

    let format = record.format;
    let id = store
        .create_transaction(&NewTransaction {
            group_id: chat_id,
            bot_name: bot_name.to_string(),
            record,
            received_at,
        })
        .await?;

    tracing::info!(
        "[{}] Stored {} transaction {} from chat {}",
        bot_name,
        format,
        id,
        chat_id
    );
    Ok(IngestOutcome::Stored(id))
}
