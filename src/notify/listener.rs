//! Chat registration listener.
//!
//! Long-polls the bot for incoming messages and registers every chat that
//! writes to it. Transport failures back off exponentially up to a cap.

use std::sync::Arc;
use std::time::Duration;

use crate::models::NotifyConfig;
use crate::notify::telegram::{TelegramBot, Update};
use crate::notify::{ChatId, ChatSender, Recipients};

/// Exponential backoff, doubling from one second up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(max: Duration) -> Self {
        let initial = Duration::from_secs(1).min(max);
        Self {
            current: initial,
            initial,
            max,
        }
    }

    /// Delay to wait now; the following call returns twice as much, capped.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Register the chats found in `updates`.
///
/// Returns the next polling offset and the chats registered for the first time.
pub fn register_chats(
    updates: &[Update],
    offset: i64,
    recipients: &Recipients,
) -> (i64, Vec<ChatId>) {
    let mut next_offset = offset;
    let mut registered = Vec::new();
    for update in updates {
        next_offset = next_offset.max(update.update_id + 1);
        if let Some(chat_id) = update.chat_id() {
            if recipients.add(chat_id) {
                registered.push(chat_id);
            }
        }
    }
    (next_offset, registered)
}

/// Poll for registrations until the task is dropped.
///
/// Only a chat's first message is answered with the welcome text; later
/// messages from an already registered chat get no reply.
pub async fn run_registrations(bot: Arc<TelegramBot>, recipients: Recipients, config: NotifyConfig) {
    match bot.get_me().await {
        Ok(me) => log::info!(
            "Authorized on account {}",
            me.username.as_deref().unwrap_or("<unnamed>")
        ),
        Err(e) => log::warn!("Bot identity check failed: {}", e),
    }

    let mut offset = 0;
    let mut backoff = Backoff::new(Duration::from_secs(config.max_backoff_secs.max(1)));

    loop {
        let updates = match bot.get_updates(offset, config.poll_timeout_secs).await {
            Ok(updates) => {
                backoff.reset();
                updates
            }
            Err(e) => {
                let delay = backoff.next_delay();
                log::warn!("Update polling failed: {}. Retrying in {:?}", e, delay);
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        let (next_offset, registered) = register_chats(&updates, offset, &recipients);
        offset = next_offset;

        for chat_id in registered {
            log::info!("New chat id {} ({} registered)", chat_id, recipients.len());
            if let Err(e) = bot.send_message(chat_id, &config.welcome_message).await {
                log::warn!("Welcome message to {} failed: {}", chat_id, e);
            }
        }
    }
}
