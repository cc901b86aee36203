use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Text shown to the operator in place of the expected content.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "This article is no longer available.",
            Error::Fetch(_) | Error::Http(_) => "Failed to load article content.",
            Error::Extraction(_) => "Could not extract content from this article.",
            Error::Summarization(_) => "Could not summarize this article.",
            _ => "Something went wrong while loading insights.",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
