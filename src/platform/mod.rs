pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::render::RenderedView;

/// Identity of a message the bot can edit or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// An event received from the chat platform, consumed once by the router.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `/name arg1 arg2 ...` typed by the user.
    TypedCommand {
        name: String,
        args: Vec<String>,
        chat_id: i64,
        user_id: Option<u64>,
    },
    /// An inline keyboard button under one of the bot's messages.
    ButtonPress {
        callback_id: String,
        token: String,
        origin: MessageRef,
        user_id: u64,
    },
    /// A photo whose caption may carry a command.
    MediaMessage {
        caption: String,
        attachment: String,
        chat_id: i64,
        user_id: Option<u64>,
    },
}

impl InboundEvent {
    pub fn chat_id(&self) -> i64 {
        match self {
            InboundEvent::TypedCommand { chat_id, .. } => *chat_id,
            InboundEvent::ButtonPress { origin, .. } => origin.chat_id,
            InboundEvent::MediaMessage { chat_id, .. } => *chat_id,
        }
    }

    pub fn user_id(&self) -> Option<u64> {
        match self {
            InboundEvent::TypedCommand { user_id, .. } => *user_id,
            InboundEvent::ButtonPress { user_id, .. } => Some(*user_id),
            InboundEvent::MediaMessage { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::TypedCommand { .. } => "command",
            InboundEvent::ButtonPress { .. } => "button",
            InboundEvent::MediaMessage { .. } => "media",
        }
    }
}

/// Split `/name@bot arg ...` into a lower-cased command name and its
/// whitespace-separated arguments. Returns `None` for plain text.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), tokens.map(str::to_string).collect()))
}

/// The primitives the interaction controller needs from a chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Answer a button press so the client stops showing a spinner.
    async fn acknowledge(&self, callback_id: &str) -> Result<()>;

    async fn send(&self, chat_id: i64, view: &RenderedView) -> Result<MessageRef>;

    async fn edit(&self, message: MessageRef, view: &RenderedView) -> Result<()>;

    async fn delete(&self, message: MessageRef) -> Result<()>;

    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("/sentiment Solana"),
            Some(("sentiment".to_string(), vec!["Solana".to_string()]))
        );
        assert_eq!(
            parse_command("/Start@DugTrioBot"),
            Some(("start".to_string(), vec![]))
        );
        assert_eq!(
            parse_command("  /pnl   bonk  extra "),
            Some((
                "pnl".to_string(),
                vec!["bonk".to_string(), "extra".to_string()]
            ))
        );
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command(""), None);
    }
}
