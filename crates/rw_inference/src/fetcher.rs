use std::sync::Arc;

use rw_core::{ArticleRecord, Error, PageFetcher, Result, Summarizer};
use tracing::{info, warn};

use crate::extract::extract_text;

/// Telegram rejects messages longer than this.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Article text beyond this is dropped before prompting.
pub const MAX_PROMPT_CONTENT_CHARS: usize = 24_000;

pub fn build_prompt(record: &ArticleRecord, content: &str) -> String {
    let content: String = content.chars().take(MAX_PROMPT_CONTENT_CHARS).collect();
    format!(
        "Summarize the following research article with sections:\n\
         Title, Key points, Impact on markets, Source, Date, Link.\n\n\
         Title: {}\nSource: {}\nDate: {}\nLink: {}\n\n\
         Article Text:\n{}",
        record.title,
        record.source.name(),
        record.display_date(),
        record.url,
        content
    )
}

/// Keeps the head of `text` within `max_chars`, marking the cut with an ellipsis.
pub fn truncate_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Fetches an article, extracts its text and asks the model for a summary.
pub struct SummaryFetcher {
    pages: Arc<dyn PageFetcher>,
    model: Arc<dyn Summarizer>,
    max_chars: usize,
}

impl SummaryFetcher {
    pub fn new(pages: Arc<dyn PageFetcher>, model: Arc<dyn Summarizer>) -> Self {
        Self {
            pages,
            model,
            max_chars: MAX_MESSAGE_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub async fn fetch_and_summarize(&self, record: &ArticleRecord) -> Result<String> {
        let page = self.pages.get(&record.url).await?;
        if !page.is_success() {
            warn!("Article fetch returned HTTP {} for {}", page.status, record.url);
            return Err(Error::Fetch(format!("HTTP {} for {}", page.status, record.url)));
        }

        let content = extract_text(&record.url, &page).await?;
        info!("📄 Extracted {} chars from {}", content.len(), record.url);

        let prompt = build_prompt(record, &content);
        let summary = self.model.complete(&prompt).await?;
        if summary.trim().is_empty() {
            return Err(Error::Summarization(format!("{} returned an empty summary", self.model.name())));
        }
        info!("🤖 Summary ready for {} (via {})", record.title, self.model.name());

        Ok(truncate_message(summary.trim(), self.max_chars))
    }
}
