use crate::config::PollingConfig;
use crate::handlers::ingestion::ingest_text;
use crate::handlers::reports::{handle_callback, handle_command, parse_command};
use crate::integrations::bot_client::{BotClient, IncomingUpdate, UpdateKind};
use crate::reports::ReportController;
use crate::storage::TransactionStore;
use chrono::Utc;
use extractors::NotificationParser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Update loop for one bot identity
pub struct BotRunner {
    name: String,
    client: Arc<dyn BotClient>,
    parser: Arc<NotificationParser>,
    store: Arc<dyn TransactionStore>,
    controller: Arc<ReportController>,
    polling: PollingConfig,
    shutdown: Arc<AtomicBool>,
}

impl BotRunner {
    pub fn new(
        name: impl Into<String>,
        client: Arc<dyn BotClient>,
        parser: Arc<NotificationParser>,
        store: Arc<dyn TransactionStore>,
        controller: Arc<ReportController>,
        polling: PollingConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            parser,
            store,
            controller,
            polling,
            shutdown,
        }
    }

    /// Poll until the shutdown flag is set. Updates in a batch are handled
    /// one at a time, in order; poll errors are retried after a delay.
    pub async fn run(self) {
        tracing::info!("[{}] Bot runner started", self.name);
        let mut offset = 0;

        while !self.shutdown.load(Ordering::SeqCst) {
            match self
                .client
                .get_updates(offset, self.polling.timeout_secs)
                .await
            {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    tracing::error!("[{}] Polling failed: {:#}", self.name, e);
                    tokio::time::sleep(Duration::from_secs(self.polling.retry_delay_secs)).await;
                }
            }
        }

        tracing::info!("[{}] Bot runner stopped", self.name);
    }

    /// Handle a single update; failures are logged, never returned
    pub async fn handle_update(&self, update: IncomingUpdate) {
        let now = Utc::now();

        let result = match update.kind {
            UpdateKind::Text { chat_id, text, .. } => match parse_command(&text) {
                Some(command) => {
                    handle_command(self.client.as_ref(), &self.controller, chat_id, command, now)
                        .await
                }
                None if text.trim_start().starts_with('/') => Ok(()),
                None => ingest_text(
                    &self.parser,
                    self.store.as_ref(),
                    &self.name,
                    chat_id,
                    &text,
                    now,
                )
                .await
                .map(|_| ()),
            },
            UpdateKind::Callback {
                callback_id,
                chat_id,
                message_id,
                data,
            } => {
                handle_callback(
                    self.client.as_ref(),
                    &self.controller,
                    chat_id,
                    message_id,
                    &callback_id,
                    &data,
                    now,
                )
                .await
            }
            UpdateKind::Other => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!("[{}] Update {} failed: {:#}", self.name, update.update_id, e);
        }
    }
}
