use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Sends a single user prompt and returns the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
