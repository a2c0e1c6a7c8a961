//! Telegram Bot API notifier.
//!
//! Sends each message as a single `sendMessage` call to one chat. No retries:
//! alert delivery is best-effort.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WatchError;
use crate::notifier::Notifier;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Client for one bot posting into one chat.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        token: String,
        chat_id: String,
        timeout: Duration,
    ) -> Result<Self, WatchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WatchError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            chat_id,
        })
    }
}

impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<(), WatchError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };

        // reqwest errors embed the URL, which carries the bot token.
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                WatchError::Notify(format!("telegram request failed: {}", e.without_url()))
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            WatchError::Notify(format!(
                "telegram response unreadable: {}",
                e.without_url()
            ))
        })?;

        let parsed: Option<TelegramResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(r) if status.is_success() && r.ok => Ok(()),
            Some(r) => Err(WatchError::Notify(format!(
                "telegram HTTP {status}: {}",
                r.description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(WatchError::Notify(format!(
                "telegram HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            ))),
        }
    }
}
