use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rw_core::{ChatId, ChatTransport, Error, InlineButton, MessageId, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const API_BASE: &str = "https://api.telegram.org";

/// Seconds the server may hold a `getUpdates` request open.
pub const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

fn reply_markup(button: &InlineButton) -> Value {
    json!({
        "inline_keyboard": [[InlineKeyboardButton {
            text: &button.label,
            callback_data: &button.payload,
        }]]
    })
}

/// Telegram Bot API client.
pub struct TelegramTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl TelegramTransport {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Config("TELEGRAM_BOT_TOKEN is required".to_string()));
        }
        // Long polls override this per request.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", API_BASE, token.trim()),
            timeout,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &Value, timeout: Duration) -> Result<T> {
        debug!("Telegram {}", method);
        // The URL carries the token, so it is stripped from transport errors.
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} failed: {}", method, e.without_url())))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("{} returned an unreadable response: {}", method, e.without_url())))?;

        parse_response(method, body)
    }

    pub async fn answer_callback_query(&self, query_id: &str) -> Result<()> {
        let params = json!({ "callback_query_id": query_id });
        self.call::<Value>("answerCallbackQuery", &params, self.timeout).await?;
        Ok(())
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let params = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query"],
        });
        let timeout = Duration::from_secs(POLL_TIMEOUT_SECS) + self.timeout;
        self.call("getUpdates", &params, timeout).await
    }

    /// Returns the newest pending update id without waiting. Asking for offset -1
    /// makes the server drop everything older.
    pub async fn latest_update_id(&self) -> Result<Option<i64>> {
        let params = json!({
            "offset": -1,
            "timeout": 0,
            "allowed_updates": ["message", "callback_query"],
        });
        let updates: Vec<Update> = self.call("getUpdates", &params, self.timeout).await?;
        Ok(updates.iter().map(|u| u.update_id).max())
    }
}

fn parse_response<T>(method: &str, body: ApiResponse<T>) -> Result<T> {
    if !body.ok {
        return Err(Error::Transport(format!(
            "{}: {}",
            method,
            body.description.unwrap_or_else(|| "unknown error".to_string())
        )));
    }
    body.result
        .ok_or_else(|| Error::Transport(format!("{}: response without result", method)))
}

impl fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("endpoint", &format!("{}/bot<redacted>", API_BASE))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str, button: Option<&InlineButton>) -> Result<MessageId> {
        let mut params = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(button) = button {
            params["reply_markup"] = reply_markup(button);
        }
        let message: Message = self.call("sendMessage", &params, self.timeout).await?;
        Ok(message.message_id)
    }

    async fn edit_message(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        // Plain text: model output is not valid Telegram markup.
        let params = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        self.call::<Value>("editMessageText", &params, self.timeout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_core::{ArticleId, CallbackPayload, Source};

    #[test]
    fn test_debug_redacts_token() {
        let transport = TelegramTransport::new("123456:SECRET", Duration::from_secs(5)).unwrap();
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("SECRET"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_empty_token_is_config_error() {
        let result = TelegramTransport::new("  ", Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_reply_markup_shape() {
        let id = ArticleId::derive(Source::Admis, "https://a.example/x");
        let button = InlineButton::load_insights(&CallbackPayload::new(id));
        let markup = reply_markup(&button);
        assert_eq!(markup["inline_keyboard"][0][0]["text"], "🧠 Load Insights");
        assert_eq!(
            markup["inline_keyboard"][0][0]["callback_data"],
            "INSIGHTS|0838fe689f1c30c1762e16af7d30eee8"
        );
    }

    #[test]
    fn test_api_error_description() {
        let body: ApiResponse<Value> =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#).unwrap();
        match parse_response("sendMessage", body) {
            Err(Error::Transport(message)) => assert!(message.contains("chat not found")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_updates() {
        let body: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok":true,"result":[
                {"update_id":10,"message":{"message_id":1,"chat":{"id":42,"type":"private"},"from":{"id":42,"is_bot":false,"first_name":"A"},"text":"/start"}},
                {"update_id":11,"callback_query":{"id":"q1","from":{"id":42,"is_bot":false,"first_name":"A"},"chat_instance":"x","data":"INSIGHTS|abc","message":{"message_id":5,"chat":{"id":42,"type":"private"}}}}
            ]}"#,
        )
        .unwrap();
        let updates = parse_response("getUpdates", body).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/start"));
        let query = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(query.data.as_deref(), Some("INSIGHTS|abc"));
        assert_eq!(query.message.as_ref().unwrap().message_id, 5);
    }
}
