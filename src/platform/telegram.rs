use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::platform::{parse_command, InboundEvent, MessageRef, Transport};
use crate::render::{Keyboard, RenderedView};

/// Commands advertised in the Telegram client's menu.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show the main menu")]
    Start,
    #[command(description = "Show the main menu")]
    Help,
    #[command(description = "Sentiment for a project: /sentiment <project>")]
    Sentiment,
    #[command(description = "7-day sentiment history: /history <project>")]
    History,
    #[command(description = "PNL cards for a project: /pnl <project>")]
    Pnl,
    #[command(description = "Top trending projects")]
    TopProjects,
    #[command(description = "Track a wallet: /trackwallet <address>")]
    TrackWallet,
    #[command(description = "Premium subscription")]
    Subscribe,
}

fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| {
                InlineKeyboardButton::callback(button.label.clone(), button.token.clone())
            })
            .collect::<Vec<_>>()
    }))
}

/// [`Transport`] backed by the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn acknowledge(&self, callback_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await
            .context("answerCallbackQuery failed")?;
        Ok(())
    }

    async fn send(&self, chat_id: i64, view: &RenderedView) -> Result<MessageRef> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), view.text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = &view.keyboard {
            request = request.reply_markup(markup(keyboard));
        }

        let message = request.await.context("sendMessage failed")?;
        Ok(MessageRef {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
        })
    }

    async fn edit(&self, message: MessageRef, view: &RenderedView) -> Result<()> {
        let mut request = self
            .bot
            .edit_message_text(
                ChatId(message.chat_id),
                MessageId(message.message_id),
                view.text.clone(),
            )
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = &view.keyboard {
            request = request.reply_markup(markup(keyboard));
        }

        match request.await {
            Ok(_) => Ok(()),
            // Already showing exactly this view.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e).context("editMessageText failed"),
        }
    }

    async fn delete(&self, message: MessageRef) -> Result<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await
            .context("deleteMessage failed")?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .with_context(|| format!("Invalid photo URL: {}", url))?;
        self.bot
            .send_photo(ChatId(chat_id), InputFile::url(url))
            .await
            .context("sendPhoto failed")?;
        Ok(())
    }
}

/// Run the Telegram dispatcher until Ctrl-C.
pub async fn run(bot: Bot, controller: Arc<Controller>) -> Result<()> {
    info!("Starting Telegram platform...");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Every event gets its own task so a slow backend call never holds up
/// other chats.
fn spawn_interaction(controller: Arc<Controller>, event: InboundEvent) {
    tokio::spawn(async move {
        let interaction = controller.handle(event).await;
        debug!(
            "Interaction {} ({:?}) ended at {:?}, delivered: {}, error: {:?}",
            interaction.id,
            interaction.intent,
            interaction.stage,
            interaction.delivered,
            interaction.error
        );
    });
}

async fn handle_callback(
    bot: Bot,
    query: CallbackQuery,
    controller: Arc<Controller>,
) -> ResponseResult<()> {
    match callback_event(&query) {
        Some(event) => spawn_interaction(controller, event),
        None => {
            debug!("Callback query without message or data, acknowledging only");
            bot.answer_callback_query(query.id.clone()).await.ok();
        }
    }
    Ok(())
}

async fn handle_message(msg: Message, controller: Arc<Controller>) -> ResponseResult<()> {
    if let Some(event) = message_event(&msg) {
        spawn_interaction(controller, event);
    }
    Ok(())
}

fn callback_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let token = query.data.clone()?;
    let message = query.message.as_ref()?;
    Some(InboundEvent::ButtonPress {
        callback_id: query.id.to_string(),
        token,
        origin: MessageRef {
            chat_id: message.chat().id.0,
            message_id: message.id().0,
        },
        user_id: query.from.id.0,
    })
}

fn message_event(msg: &Message) -> Option<InboundEvent> {
    let chat_id = msg.chat.id.0;
    let user_id = msg.from.as_ref().map(|user| user.id.0);

    if let Some(text) = msg.text() {
        let (name, args) = parse_command(text)?;
        return Some(InboundEvent::TypedCommand {
            name,
            args,
            chat_id,
            user_id,
        });
    }

    let photo = msg.photo()?.last()?;
    let caption = msg.caption()?;
    Some(InboundEvent::MediaMessage {
        caption: caption.to_string(),
        attachment: photo.file.id.to_string(),
        chat_id,
        user_id,
    })
}
