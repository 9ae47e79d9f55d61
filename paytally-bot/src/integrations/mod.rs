pub mod bot_client;
pub mod telegram;

pub use bot_client::{BotClient, IncomingUpdate, MenuButton, UpdateKind};
pub use telegram::TelegramClient;
