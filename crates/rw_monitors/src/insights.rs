use std::sync::Arc;

use rw_core::{ArticleRegistry, CallbackPayload, ChatId, ChatTransport, MessageId, Result};
use rw_inference::SummaryFetcher;
use tracing::{error, info, warn};

pub const LOADING_TEXT: &str = "⏳ Loading insights…";

/// Answers "Load Insights" presses by replacing the alert with a summary.
pub struct InsightsHandler {
    registry: Arc<dyn ArticleRegistry>,
    summaries: Arc<SummaryFetcher>,
    transport: Arc<dyn ChatTransport>,
}

impl InsightsHandler {
    pub fn new(
        registry: Arc<dyn ArticleRegistry>,
        summaries: Arc<SummaryFetcher>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            registry,
            summaries,
            transport,
        }
    }

    /// Returns `false` when the payload is not ours and nothing was done.
    pub async fn handle(&self, chat_id: ChatId, message_id: MessageId, data: &str) -> bool {
        let Some(payload) = CallbackPayload::parse(data) else {
            return false;
        };

        if let Err(e) = self.transport.edit_message(chat_id, message_id, LOADING_TEXT).await {
            warn!("Failed to show loading placeholder: {}", e);
        }

        let text = match self.summarize(payload).await {
            Ok(summary) => summary,
            Err(e) => {
                error!("Insights failed for message {}: {}", message_id, e);
                e.user_message().to_string()
            }
        };

        if let Err(e) = self.transport.edit_message(chat_id, message_id, &text).await {
            error!("Failed to deliver insights for message {}: {}", message_id, e);
        }
        true
    }

    async fn summarize(&self, payload: Result<CallbackPayload>) -> Result<String> {
        let payload = payload?;
        let record = self.registry.resolve(&payload.id).await?;
        info!("🧠 Loading insights for {}", record.title);
        self.summaries.fetch_and_summarize(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rw_core::{ArticleId, ArticleRecord, Error, FetchedPage, InlineButton, PageFetcher, Source, Summarizer};
    use rw_storage::MemoryArticleRegistry;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        edits: Mutex<Vec<(ChatId, MessageId, String)>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_message(&self, _: ChatId, _: &str, _: Option<&InlineButton>) -> Result<MessageId> {
            Ok(1)
        }

        async fn edit_message(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
            self.edits.lock().await.push((chat_id, message_id, text.to_string()));
            Ok(())
        }
    }

    const ARTICLE_HTML: &str = "<p>Wheat futures rose on export demand.</p>";

    struct Pages {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl PageFetcher for Pages {
        async fn get(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: self.status,
                content_type: Some("text/html".to_string()),
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    /// Answers with a fixed summary, or fails like an unreachable model when `None`.
    struct FixedModel(Option<&'static str>);

    #[async_trait]
    impl Summarizer for FixedModel {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            match self.0 {
                Some(summary) => Ok(summary.to_string()),
                None => Err(Error::Summarization("HTTP 503: overloaded".to_string())),
            }
        }
    }

    async fn setup(status: u16) -> (InsightsHandler, Arc<RecordingTransport>, ArticleId) {
        let pages = Pages { status, body: ARTICLE_HTML };
        setup_with(pages, FixedModel(Some("Key points: wheat up."))).await
    }

    async fn setup_with(pages: Pages, model: FixedModel) -> (InsightsHandler, Arc<RecordingTransport>, ArticleId) {
        let registry = Arc::new(MemoryArticleRegistry::new());
        let record = ArticleRecord {
            title: "Wheat outlook".to_string(),
            url: "https://www.admis.com/wheat/".to_string(),
            date_text: String::new(),
            published_at: None,
            source: Source::Admis,
            discovered_at: Utc::now(),
        };
        let id = record.id();
        registry.register(&id, &record).await.unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let summaries = Arc::new(SummaryFetcher::new(Arc::new(pages), Arc::new(model)));
        let handler = InsightsHandler::new(registry, summaries, transport.clone());
        (handler, transport, id)
    }

    #[tokio::test]
    async fn test_summary_replaces_placeholder() {
        let (handler, transport, id) = setup(200).await;
        let payload = CallbackPayload::new(id).encode();

        assert!(handler.handle(7, 99, &payload).await);

        let edits = transport.edits.lock().await;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0], (7, 99, LOADING_TEXT.to_string()));
        assert_eq!(edits[1], (7, 99, "Key points: wheat up.".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_article_reports_unavailable() {
        let (handler, transport, _) = setup(200).await;
        let other = ArticleId::derive(Source::Saxo, "https://www.home.saxo/gone");

        assert!(handler.handle(7, 99, &CallbackPayload::new(other).encode()).await);

        let edits = transport.edits.lock().await;
        assert_eq!(edits.last().unwrap().2, "This article is no longer available.");
    }

    #[tokio::test]
    async fn test_malformed_id_reports_unavailable() {
        let (handler, transport, _) = setup(200).await;

        assert!(handler.handle(7, 99, "INSIGHTS|zzz").await);

        let edits = transport.edits.lock().await;
        assert_eq!(edits.last().unwrap().2, Error::NotFound(String::new()).user_message());
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_user_message() {
        let (handler, transport, id) = setup(404).await;

        assert!(handler.handle(7, 99, &CallbackPayload::new(id).encode()).await);

        let edits = transport.edits.lock().await;
        assert_eq!(edits.last().unwrap().2, "Failed to load article content.");
    }

    #[tokio::test]
    async fn test_empty_page_reports_extraction_failure() {
        let pages = Pages {
            status: 200,
            body: "<html><div>Subscribe to read more</div></html>",
        };
        let (handler, transport, id) = setup_with(pages, FixedModel(Some("unused"))).await;

        assert!(handler.handle(7, 99, &CallbackPayload::new(id).encode()).await);

        let edits = transport.edits.lock().await;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[1], (7, 99, "Could not extract content from this article.".to_string()));
    }

    #[tokio::test]
    async fn test_model_failure_reports_summarization_failure() {
        let pages = Pages {
            status: 200,
            body: ARTICLE_HTML,
        };
        let (handler, transport, id) = setup_with(pages, FixedModel(None)).await;

        assert!(handler.handle(7, 99, &CallbackPayload::new(id).encode()).await);

        let edits = transport.edits.lock().await;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[1], (7, 99, "Could not summarize this article.".to_string()));
    }

    #[tokio::test]
    async fn test_foreign_payload_is_ignored() {
        let (handler, transport, _) = setup(200).await;

        assert!(!handler.handle(7, 99, "VOTE|up").await);
        assert!(!handler.handle(7, 99, "plain").await);
        assert!(transport.edits.lock().await.is_empty());
    }
}
