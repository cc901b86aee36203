use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rw_core::{Error, Result};

pub mod extract;
pub mod fetcher;
pub mod models;

pub use fetcher::{SummaryFetcher, MAX_MESSAGE_CHARS};
pub use models::create_model;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    OpenAi,
    Dummy,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "dummy" => Ok(Self::Dummy),
            other => Err(Error::Config(format!("Unknown model: {}. Available: openai, dummy", other))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Dummy => f.write_str("dummy"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub kind: ModelKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_name: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: ModelKind::OpenAi,
            api_key: None,
            base_url: None,
            model_name: None,
            max_tokens: None,
            timeout: rw_core::http::DEFAULT_TIMEOUT,
        }
    }
}

pub mod prelude {
    pub use super::{Config, ModelKind, SummaryFetcher};
    pub use super::models::create_model;
    pub use rw_core::{ArticleRecord, Error, Result, Summarizer};
}
