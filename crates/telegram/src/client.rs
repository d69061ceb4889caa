//! Telegram Bot API client.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use snacklane_core::TelegramId;

use super::error::TelegramError;

/// Default Bot API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client for sending chat messages.
#[derive(Clone)]
pub struct BotClient {
    client: Client,
    bot_token: SecretString,
    api_base: String,
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient")
            .field("bot_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl BotClient {
    /// Create a new Bot API client.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError::Config` if the HTTP client cannot be built.
    pub fn new(bot_token: SecretString, api_base: &str) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelegramError::Config(e.to_string()))?;

        Ok(Self {
            client,
            bot_token,
            api_base: api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// The bot token, for signature verification.
    #[must_use]
    pub const fn bot_token(&self) -> &SecretString {
        &self.bot_token
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Send an HTML-formatted message to a chat.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the Bot API rejects the message
    /// (for example when the user has blocked the bot).
    #[instrument(skip(self, text), fields(chat_id = %chat_id))]
    pub async fn send_message(&self, chat_id: TelegramId, text: &str) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id: chat_id.as_i64(),
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let result: ApiResponse = response
            .json()
            .await
            .map_err(|e| TelegramError::Response(e.without_url().to_string()))?;

        if !result.ok {
            let description = result
                .description
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(error = %description, "Telegram API rejected message");
            return Err(TelegramError::Api(description));
        }

        debug!("Message sent to Telegram");
        Ok(())
    }
}

/// Escape text for the HTML parse mode used by [`BotClient::send_message`].
#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
