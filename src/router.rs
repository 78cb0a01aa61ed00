use anyhow::Result;
use tracing::{debug, error, info};

use crate::lookup::{LookupError, PhoneLookup};
use crate::platform::{ChatSurface, IncomingMessage};
use crate::reply::Reply;

/// What to do with an inbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/start`, optionally addressed as `/start@botname`
    Start,
    /// Any other slash command; deliberately ignored
    Command(&'a str),
    /// Plain text, looked up verbatim
    Lookup(&'a str),
}

impl<'a> Route<'a> {
    pub fn classify(text: &'a str) -> Self {
        if !text.starts_with('/') {
            return Route::Lookup(text);
        }

        let token = text.split_whitespace().next().unwrap_or(text);
        let command = token.split('@').next().unwrap_or(token);
        if command == "/start" {
            Route::Start
        } else {
            Route::Command(command)
        }
    }
}

/// Handle one inbound message. Sends at most one reply.
pub async fn handle(
    surface: &dyn ChatSurface,
    lookup: &dyn PhoneLookup,
    msg: &IncomingMessage,
) -> Result<()> {
    match Route::classify(&msg.text) {
        Route::Start => {
            info!("/start from {} in chat {}", msg.user_name, msg.chat_id);
            surface.reply(msg, &Reply::welcome(&msg.user_name)).await
        }
        Route::Command(command) => {
            debug!("Ignoring unknown command {} in chat {}", command, msg.chat_id);
            Ok(())
        }
        Route::Lookup(subject) => {
            info!("Received number: {} from chat_id: {}", subject, msg.chat_id);

            let reply = {
                let _typing = surface.start_typing(msg.chat_id).await;
                lookup_reply(lookup, subject).await
            };

            surface.reply(msg, &reply).await
        }
    }
}

async fn lookup_reply(lookup: &dyn PhoneLookup, subject: &str) -> Reply {
    match lookup.lookup(subject).await {
        Ok(result) => Reply::from_result(subject, &result),
        Err(e) => {
            match &e {
                LookupError::ServiceUnavailable(status) => {
                    error!("HTTP error occurred for {}: {}", subject, status)
                }
                LookupError::Connectivity(err) => {
                    error!("Request error occurred for {}: {}", subject, err)
                }
                LookupError::Unknown(detail) => {
                    error!("An unknown error occurred for {}: {}", subject, detail)
                }
            }
            Reply::from_error(&e)
        }
    }
}
