//! Notification fan-out.
//!
//! Each recipient gets its own spawned send, bounded by a timeout, so one
//! slow or failing chat cannot hold up the others. Failures are logged and
//! counted, never returned as errors.

pub mod listener;
pub mod telegram;

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::{AppError, Result};

pub use telegram::TelegramBot;

/// Chat identifier as used by the bot API.
pub type ChatId = i64;

/// Delivers a text message to one chat.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;
}

/// Registered chats. Append-only; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    inner: Arc<RwLock<HashSet<ChatId>>>,
}

impl Recipients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chat. Returns `false` if it was already registered.
    pub fn add(&self, chat_id: ChatId) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat_id)
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&chat_id)
    }

    /// Current chats, sorted.
    pub fn snapshot(&self) -> Vec<ChatId> {
        let mut chats: Vec<ChatId> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();
        chats.sort_unstable();
        chats
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends one message to every registered recipient in parallel.
#[derive(Clone)]
pub struct FanOut {
    sender: Arc<dyn ChatSender>,
    recipients: Recipients,
    send_timeout: Duration,
}

impl FanOut {
    pub fn new(sender: Arc<dyn ChatSender>, recipients: Recipients, send_timeout: Duration) -> Self {
        Self {
            sender,
            recipients,
            send_timeout,
        }
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    /// Send `text` to all recipients registered right now and wait for every send to settle.
    pub async fn broadcast(&self, text: &str) -> DeliveryReport {
        let text: Arc<str> = Arc::from(text);
        let sends: Vec<_> = self
            .recipients
            .snapshot()
            .into_iter()
            .map(|chat_id| {
                let sender = Arc::clone(&self.sender);
                let text = Arc::clone(&text);
                let limit = self.send_timeout;
                tokio::spawn(async move {
                    let result =
                        match tokio::time::timeout(limit, sender.send_message(chat_id, &text)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(AppError::notify(
                                chat_id,
                                format!("timed out after {:?}", limit),
                            )),
                        };
                    (chat_id, result)
                })
            })
            .collect();

        let mut report = DeliveryReport::default();
        for joined in join_all(sends).await {
            match joined {
                Ok((_, Ok(()))) => report.delivered += 1,
                Ok((chat_id, Err(e))) => {
                    report.failed += 1;
                    log::warn!("Send to chat {} failed: {}", chat_id, e);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!("Send task aborted: {}", e);
                }
            }
        }
        report
    }
}
