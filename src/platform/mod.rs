pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::reply::Reply;

/// A text message received from the platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Chat the message arrived in; replies go back here
    pub chat_id: i64,
    /// Platform message ID, used to thread the reply
    pub message_id: i32,
    /// Display (first) name of the sender
    pub user_name: String,
    /// The message text
    pub text: String,
}

/// Keeps a chat's "typing…" indicator alive until dropped.
pub struct TypingGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl TypingGuard {
    /// `release` runs exactly once, when the guard goes out of scope.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// The outbound half of a chat platform.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Send `reply` as an answer to `msg`.
    async fn reply(&self, msg: &IncomingMessage, reply: &Reply) -> Result<()>;

    /// Show the typing indicator in `chat_id` until the returned guard is dropped.
    async fn start_typing(&self, chat_id: i64) -> TypingGuard;
}
