use async_trait::async_trait;
use rw_core::{Result, Summarizer};

/// Offline stand-in that echoes the first words of the article text.
#[derive(Debug, Default)]
pub struct DummyModel;

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Summarizer for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = prompt
            .split_once("Article Text:")
            .map(|(_, text)| text)
            .unwrap_or(prompt);
        let words: Vec<&str> = body.split_whitespace().take(20).collect();
        Ok(words.join(" "))
    }
}
