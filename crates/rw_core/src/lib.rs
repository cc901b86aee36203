pub mod error;
pub mod http;
pub mod models;
pub mod notify;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use http::{FetchedPage, HttpFetcher, PageFetcher};
pub use models::Summarizer;
pub use notify::{ChatId, ChatTransport, InlineButton, MessageId};
pub use storage::{ArticleRegistry, SeenStore};
pub use types::{ArticleId, ArticleRecord, CallbackPayload, RawCandidate, Source};
