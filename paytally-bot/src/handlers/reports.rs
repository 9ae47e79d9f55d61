use crate::integrations::bot_client::BotClient;
use crate::reports::{escape_markdown, ReportController};
use anyhow::Result;
use chrono::{DateTime, Utc};
use shared_types::Dimension;

const USAGE_TEXT: &str = "Usage: /report, /report bank or /report via";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask which period to report on
    Report(Option<Dimension>),
    Usage,
}

/// Recognise `/report`, `/report bank` and `/report via`, with or without an
/// `@botname` suffix. Other commands and plain text yield `None`.
pub fn parse_command(text: &str) -> Option<Command> {
    let mut words = text.split_whitespace();
    let head = words.next()?;
    let name = head.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    if !name.eq_ignore_ascii_case("report") {
        return None;
    }

    let command = match (words.next(), words.next()) {
        (None, _) => Command::Report(None),
        (Some(arg), None) if arg.eq_ignore_ascii_case("bank") => {
            Command::Report(Some(Dimension::Bank))
        }
        (Some(arg), None) if arg.eq_ignore_ascii_case("via") => {
            Command::Report(Some(Dimension::Transport))
        }
        _ => Command::Usage,
    };
    Some(command)
}

pub async fn handle_command(
    client: &dyn BotClient,
    controller: &ReportController,
    chat_id: i64,
    command: Command,
    now: DateTime<Utc>,
) -> Result<()> {
    match command {
        Command::Report(dimension) => {
            let menu = controller.report_menu(dimension, now);
            let message_id = client.send_menu(chat_id, &menu.text, &menu.rows).await?;
            tracing::debug!("Sent report menu {} to chat {}", message_id, chat_id);
        }
        Command::Usage => {
            client.send_text(chat_id, &escape_markdown(USAGE_TEXT)).await?;
        }
    }
    Ok(())
}

/// Reply to a pressed report button. The report (or its fallback text) is
/// sent first; removing the prompt and acknowledging the press are best-effort.
pub async fn handle_callback(
    client: &dyn BotClient,
    controller: &ReportController,
    chat_id: i64,
    prompt_message_id: i64,
    callback_id: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let text = controller.reply_for_callback(chat_id, token, now).await;
    let sent = client.send_text(chat_id, &text).await;

    if sent.is_ok() {
        if let Err(e) = client.delete_message(chat_id, prompt_message_id).await {
            tracing::warn!(
                "Could not delete report prompt {} in chat {}: {:#}",
                prompt_message_id,
                chat_id,
                e
            );
        }
    }

    if let Err(e) = client.answer_callback(callback_id).await {
        tracing::warn!("Could not answer callback {}: {:#}", callback_id, e);
    }

    sent.map(|message_id| {
        tracing::debug!("Sent report {} to chat {}", message_id, chat_id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_commands() {
        assert_eq!(parse_command("/report"), Some(Command::Report(None)));
        assert_eq!(parse_command("/report bank"), Some(Command::Report(Some(Dimension::Bank))));
        assert_eq!(
            parse_command("/report@PayTallyBot via"),
            Some(Command::Report(Some(Dimension::Transport)))
        );
        assert_eq!(parse_command("  /REPORT  "), Some(Command::Report(None)));
    }

    #[test]
    fn test_bad_arguments_get_usage() {
        assert_eq!(parse_command("/report card"), Some(Command::Usage));
        assert_eq!(parse_command("/report bank via"), Some(Command::Usage));
    }

    #[test]
    fn test_other_text_is_not_a_command() {
        assert_eq!(parse_command("/start"), None);
        assert_eq!(parse_command("report"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("$3.00 paid by JOHN DOE"), None);
    }
}
