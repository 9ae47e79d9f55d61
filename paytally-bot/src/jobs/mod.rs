pub mod bot_runner;

pub use bot_runner::BotRunner;
