use crate::constants::TELEGRAM_API;
use crate::error::{AppError, Result};
use crate::utils::{build_http_client, send_json};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Push-style message channel with a fixed destination
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one fully rendered Markdown message
    async fn send_markdown(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage`
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: i64,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: i64, timeout: Duration) -> Result<Self> {
        Self::with_api_base(TELEGRAM_API.to_string(), token, chat_id, timeout)
    }

    pub fn with_api_base(
        api_base: String,
        token: String,
        chat_id: i64,
        timeout: Duration,
    ) -> Result<Self> {
        if token.is_empty() {
            return Err(AppError::Config("TELEGRAM_TOKEN is empty".to_string()));
        }
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            chat_id,
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_markdown(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let body = SendMessageRequest {
            chat_id: self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response: TelegramResponse = send_json(self.client.post(&url).json(&body), "Telegram")
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;

        if !response.ok {
            return Err(AppError::Notify(format!(
                "Telegram rejected message: {}",
                response.description.unwrap_or_default()
            )));
        }

        debug!(chat_id = self.chat_id, chars = text.chars().count(), "Message sent");
        Ok(())
    }
}

/// Notifier that only logs, for dry runs
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_markdown(&self, text: &str) -> Result<()> {
        info!("[dry-run] message:\n{}", text);
        Ok(())
    }
}
