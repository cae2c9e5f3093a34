//! Telegram Bot API transport
//!
//! `ChatTransport` is the seam the runtime talks to; `TelegramClient`
//! implements it with JSON POSTs against `https://api.telegram.org`.

mod types;

pub use types::{CallbackQuery, Message, Update};

use crate::ui::View;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use types::{inline_keyboard, parse_mode_value, ApiResponse};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Server-side long-poll timeout for `getUpdates`
pub const LONG_POLL_TIMEOUT_SECS: u64 = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram {method} failed: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

impl TelegramError {
    /// Editing a message to its current content
    pub fn is_not_modified(&self) -> bool {
        matches!(self, TelegramError::Api { description, .. }
            if description.contains("message is not modified"))
    }
}

pub type TelegramResult<T> = Result<T, TelegramError>;

/// Outbound and inbound chat operations
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Long-poll for updates with `update_id >= offset`
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> TelegramResult<Vec<Update>>;

    async fn send_message(&self, chat_id: i64, view: &View) -> TelegramResult<()>;

    /// Replace the text and keyboard of an earlier message.
    /// Identical content is not an error.
    async fn edit_message(&self, chat_id: i64, message_id: i64, view: &View)
        -> TelegramResult<()>;

    /// Answer a button press, optionally with a toast
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> TelegramResult<()>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> TelegramResult<Vec<Update>> {
        (**self).get_updates(offset, timeout_secs).await
    }

    async fn send_message(&self, chat_id: i64, view: &View) -> TelegramResult<()> {
        (**self).send_message(chat_id, view).await
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> TelegramResult<()> {
        (**self).edit_message(chat_id, message_id, view).await
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> TelegramResult<()> {
        (**self).answer_callback(callback_id, text).await
    }
}

/// Text, parse mode and keyboard fields shared by send and edit
fn view_body(view: &View) -> serde_json::Value {
    let mut body = json!({
        "text": view.text,
        "disable_web_page_preview": true,
    });
    if let Some(mode) = parse_mode_value(view.parse_mode) {
        body["parse_mode"] = json!(mode);
    }
    if let Some(keyboard) = &view.keyboard {
        body["reply_markup"] = inline_keyboard(keyboard);
    }
    body
}

/// Bot API client
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> TelegramResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> TelegramResult<T> {
        // Errors carry the request URL, which contains the token
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !parsed.ok {
            return Err(TelegramError::Api {
                method,
                description: parsed
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        parsed.result.ok_or_else(|| TelegramError::Api {
            method,
            description: "response has no result".to_string(),
        })
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> TelegramResult<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        // Leave the server room to answer before the client gives up
        let timeout = Duration::from_secs(timeout_secs) + Duration::from_secs(10);
        self.call("getUpdates", body, timeout).await
    }

    async fn send_message(&self, chat_id: i64, view: &View) -> TelegramResult<()> {
        let mut body = view_body(view);
        body["chat_id"] = json!(chat_id);
        let _: serde_json::Value = self.call("sendMessage", body, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> TelegramResult<()> {
        let mut body = view_body(view);
        body["chat_id"] = json!(chat_id);
        body["message_id"] = json!(message_id);
        match self
            .call::<serde_json::Value>("editMessageText", body, REQUEST_TIMEOUT)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_modified() => {
                tracing::debug!(chat_id, message_id, "Message already up to date");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> TelegramResult<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: serde_json::Value = self
            .call("answerCallbackQuery", body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}
