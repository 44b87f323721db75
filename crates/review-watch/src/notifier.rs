//! Chat delivery.
//!
//! Sends plain-text messages to the configured Telegram chat through the Bot
//! API `sendMessage` method. Every failure is wrapped as
//! [`WatchError::Delivery`], which the poll loop never alerts on.
//! Docs: <https://core.telegram.org/bots/api#sendmessage>

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Config, Credentials};
use crate::error::{Result, WatchError};

/// Destination for notification and alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text` to the configured destination.
    async fn send(&self, text: &str) -> Result<()>;
}

/// Request body for `sendMessage`.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API response is wrapped in.
#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API notifier.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // base_url embeds the bot token
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Creates a notifier for the configured bot and chat.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::ConfigValidationError` if the HTTP client cannot
    /// be built.
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                WatchError::config_validation(
                    format!("cannot build HTTP client: {e}"),
                    "Check the TLS setup of the host",
                )
            })?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.telegram_api_url.trim_end_matches('/'),
                credentials.telegram_token
            ),
            chat_id: credentials.chat_id.clone(),
        })
    }

    async fn deliver(&self, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WatchError::delivery(e.without_url().to_string()))?;

        let status = response.status();
        let envelope: BotApiResponse = response
            .json()
            .await
            .map_err(|e| WatchError::delivery(format!("{status}: {}", e.without_url())))?;

        if !envelope.ok {
            return Err(WatchError::delivery(format!(
                "{status}: {}",
                envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string())
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[tracing::instrument(name = "send_message", skip(self, text), fields(chat_id = %self.chat_id))]
    async fn send(&self, text: &str) -> Result<()> {
        match self.deliver(text).await {
            Ok(()) => {
                tracing::debug!(text, "Bot sent message");
                tracing::info!("Message delivered");
                Ok(())
            }
            Err(e) => {
                tracing::error!(text, error = %e, "Bot failed to send message");
                Err(e)
            }
        }
    }
}
