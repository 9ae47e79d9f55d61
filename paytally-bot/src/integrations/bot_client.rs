use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inline keyboard button whose press delivers `data` back as a callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    pub label: String,
    pub data: String,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Text {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
    Callback {
        callback_id: String,
        chat_id: i64,
        /// The message that carried the pressed button
        message_id: i64,
        data: String,
    },
    /// Anything the bot does not react to
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingUpdate {
    pub update_id: i64,
    pub kind: UpdateKind,
}

/// Messaging transport used by a bot runner
#[async_trait]
pub trait BotClient: Send + Sync {
    /// Long-poll for updates with id >= `offset`
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<IncomingUpdate>>;

    /// Send MarkdownV2 text, returning the new message id
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64>;

    /// Send MarkdownV2 text with an inline keyboard, returning the new message id
    async fn send_menu(&self, chat_id: i64, text: &str, rows: &[Vec<MenuButton>]) -> Result<i64>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}
