use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::types::{ArticleId, ArticleRecord};
use crate::Result;

/// Identifiers already delivered for one source.
#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn contains(&self, id: &ArticleId) -> bool;

    /// Durable before returning `Ok`. On error the id stays unseen.
    async fn mark_seen(&self, id: &ArticleId) -> Result<()>;

    async fn len(&self) -> usize;
}

/// Records awaiting a possible "load insights" request.
#[async_trait]
pub trait ArticleRegistry: Send + Sync {
    async fn register(&self, id: &ArticleId, record: &ArticleRecord) -> Result<()>;

    /// Fails with `Error::NotFound` for unknown or evicted ids.
    async fn resolve(&self, id: &ArticleId) -> Result<ArticleRecord>;

    /// Removes entries discovered before `now - retention`, returning how many went.
    async fn evict_older_than(&self, retention: Duration, now: DateTime<Utc>) -> Result<usize>;

    async fn len(&self) -> usize;
}
