//! Telegram Bot API transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::notify::{ChatId, ChatSender};

/// Extra time on top of the long-poll timeout before the request itself gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(AppError::notify(
                "telegram",
                format!(
                    "{} failed: {}",
                    method,
                    self.description.as_deref().unwrap_or("no description")
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// Chat of a message update; other update kinds carry none.
    pub fn chat_id(&self) -> Option<ChatId> {
        self.message.as_ref().map(|m| m.chat.id)
    }
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
}

#[derive(Serialize)]
struct NoParams {}

/// Minimal Bot API client: identity, updates, and text messages.
#[derive(Clone)]
pub struct TelegramBot {
    client: Client,
    endpoint: String,
    send_timeout: Duration,
}

impl TelegramBot {
    pub fn new(api_url: &str, token: &str, send_timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            send_timeout,
        })
    }

    /// Build a bot from the token in the environment variable named by the config.
    pub fn from_env(config: &NotifyConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::config(format!("{} not set", config.token_env)))?;
        Self::new(
            &config.api_url,
            token.trim(),
            Duration::from_secs(config.send_timeout_secs),
        )
    }

    async fn call<P, T>(&self, method: &str, params: &P, timeout: Duration) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Strip URLs from errors; they carry the token.
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        body.into_result(method)
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &NoParams {}, self.send_timeout).await
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
        };
        let limit = Duration::from_secs(timeout_secs) + POLL_GRACE;
        self.call("getUpdates", &params, limit).await
    }
}

#[async_trait]
impl ChatSender for TelegramBot {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let params = SendMessage { chat_id, text };
        self.call::<_, serde_json::Value>("sendMessage", &params, self.send_timeout)
            .await
            .map(|_| ())
            .map_err(|e| AppError::notify(chat_id, e))
    }
}
