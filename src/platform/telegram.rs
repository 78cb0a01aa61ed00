use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, MessageId, ParseMode, ReplyParameters};
use tracing::{debug, error, info, warn};

use crate::lookup::LookupClient;
use crate::platform::{ChatSurface, IncomingMessage, TypingGuard};
use crate::reply::{Markup, Reply};
use crate::router;

/// Telegram drops a chat action after about five seconds.
const TYPING_REFRESH: Duration = Duration::from_secs(4);

/// Name used when an update carries no sender (e.g. channel posts).
const FALLBACK_USER_NAME: &str = "there";

/// Run the Telegram bot platform until the dispatcher stops
pub async fn run(bot: Bot, lookup: Arc<LookupClient>) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![lookup])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram platform stopped");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, lookup: Arc<LookupClient>) -> ResponseResult<()> {
    let incoming = match incoming_from(&msg) {
        Some(incoming) => incoming,
        None => return Ok(()),
    };

    let surface = TelegramSurface::new(bot);
    if let Err(e) = router::handle(&surface, lookup.as_ref(), &incoming).await {
        error!("Error handling message in chat {}: {:#}", incoming.chat_id, e);
    }

    Ok(())
}

/// Build a platform-agnostic message; non-text messages are ignored.
fn incoming_from(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?.to_string();
    let user_name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.clone())
        .unwrap_or_else(|| FALLBACK_USER_NAME.to_string());

    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        user_name,
        text,
    })
}

/// [`ChatSurface`] backed by the Telegram Bot API.
pub struct TelegramSurface {
    bot: Bot,
}

impl TelegramSurface {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSurface for TelegramSurface {
    async fn reply(&self, msg: &IncomingMessage, reply: &Reply) -> Result<()> {
        let mut request = self
            .bot
            .send_message(ChatId(msg.chat_id), reply.text.clone())
            .reply_parameters(ReplyParameters::new(MessageId(msg.message_id)));
        if reply.markup == Markup::Html {
            request = request.parse_mode(ParseMode::Html);
        }

        request
            .await
            .with_context(|| format!("Failed to send reply to chat {}", msg.chat_id))?;
        Ok(())
    }

    async fn start_typing(&self, chat_id: i64) -> TypingGuard {
        let chat = ChatId(chat_id);

        // The indicator is cosmetic; failures never block the reply
        if let Err(e) = self.bot.send_chat_action(chat, ChatAction::Typing).await {
            debug!("Failed to send typing action to chat {}: {}", chat_id, e);
        }

        let bot = self.bot.clone();
        let refresh = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TYPING_REFRESH);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if bot.send_chat_action(chat, ChatAction::Typing).await.is_err() {
                    break;
                }
            }
        });

        TypingGuard::new(move || refresh.abort())
    }
}
