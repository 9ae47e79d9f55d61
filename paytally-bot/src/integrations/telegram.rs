use crate::config::BotIdentityConfig;
use crate::integrations::bot_client::{BotClient, IncomingUpdate, MenuButton, UpdateKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Added on top of the long-poll timeout for getUpdates requests
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("{method} failed: {description}")]
    Api { method: &'static str, description: String },

    #[error("{method} returned ok without a result")]
    MissingResult { method: &'static str },
}

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    message: Option<Message>,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
    channel_post: Option<Message>,
    callback_query: Option<CallbackQuery>,
}

impl From<Update> for IncomingUpdate {
    fn from(update: Update) -> Self {
        let kind = if let Some(message) = update.message.or(update.channel_post) {
            match message.text {
                Some(text) => UpdateKind::Text {
                    chat_id: message.chat.id,
                    message_id: message.message_id,
                    text,
                },
                None => UpdateKind::Other,
            }
        } else if let Some(query) = update.callback_query {
            match (query.message, query.data) {
                (Some(message), Some(data)) => UpdateKind::Callback {
                    callback_id: query.id,
                    chat_id: message.chat.id,
                    message_id: message.message_id,
                    data,
                },
                _ => UpdateKind::Other,
            }
        } else {
            UpdateKind::Other
        };

        IncomingUpdate {
            update_id: update.update_id,
            kind,
        }
    }
}

#[derive(Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard<'a>>,
}

fn keyboard(rows: &[Vec<MenuButton>]) -> InlineKeyboard<'_> {
    InlineKeyboard {
        inline_keyboard: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| InlineButton {
                        text: &button.label,
                        callback_data: &button.data,
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Telegram Bot API client for one bot identity
pub struct TelegramClient {
    http: reqwest::Client,
    /// `<api_base>/bot<token>`, never logged
    base_url: String,
}

impl TelegramClient {
    pub fn new(identity: &BotIdentityConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                identity.api_base().trim_end_matches('/'),
                identity.token
            ),
        })
    }

    async fn call<B, T>(
        &self,
        method: &'static str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // reqwest errors carry the URL, which contains the bot token
        let response = request
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{method} request failed"))?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{method} returned an unreadable response"))?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                method,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }
            .into());
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::MissingResult { method }.into())
    }
}

#[async_trait]
impl BotClient for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<IncomingUpdate>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "channel_post", "callback_query"],
        });

        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &body,
                Some(Duration::from_secs(timeout_secs) + POLL_GRACE),
            )
            .await?;

        Ok(updates.into_iter().map(IncomingUpdate::from).collect())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "MarkdownV2",
            reply_markup: None,
        };
        let sent: Message = self.call("sendMessage", &body, None).await?;
        Ok(sent.message_id)
    }

    async fn send_menu(&self, chat_id: i64, text: &str, rows: &[Vec<MenuButton>]) -> Result<i64> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "MarkdownV2",
            reply_markup: Some(keyboard(rows)),
        };
        let sent: Message = self.call("sendMessage", &body, None).await?;
        Ok(sent.message_id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let body = serde_json::json!({ "chat_id": chat_id, "message_id": message_id });
        let _: bool = self.call("deleteMessage", &body, None).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        let _: bool = self.call("answerCallbackQuery", &body, None).await?;
        Ok(())
    }
}
