use async_trait::async_trait;

use crate::types::CallbackPayload;
use crate::Result;

pub type ChatId = i64;
pub type MessageId = i64;

/// A single button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub payload: String,
}

impl InlineButton {
    pub fn load_insights(payload: &CallbackPayload) -> Self {
        Self {
            label: "🧠 Load Insights".to_string(),
            payload: payload.encode(),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        button: Option<&InlineButton>,
    ) -> Result<MessageId>;

    async fn edit_message(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()>;
}

/// Escapes text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
