use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rw_core::{ArticleId, ArticleRecord, ArticleRegistry, Error, Result, SeenStore};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Non-durable seen set, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    seen: RwLock<HashSet<ArticleId>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn contains(&self, id: &ArticleId) -> bool {
        self.seen.read().await.contains(id)
    }

    async fn mark_seen(&self, id: &ArticleId) -> Result<()> {
        self.seen.write().await.insert(id.clone());
        Ok(())
    }

    async fn len(&self) -> usize {
        self.seen.read().await.len()
    }
}

#[derive(Debug, Default)]
pub struct MemoryArticleRegistry {
    records: RwLock<HashMap<ArticleId, ArticleRecord>>,
}

impl MemoryArticleRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleRegistry for MemoryArticleRegistry {
    async fn register(&self, id: &ArticleId, record: &ArticleRecord) -> Result<()> {
        let mut records = self.records.write().await;
        match records.get(id) {
            Some(existing) if existing == record => return Ok(()),
            Some(existing) if existing.url == record.url => debug!("Refreshing article {}", id),
            Some(existing) => warn!(
                "Article id collision for {}: replacing {} with {}",
                id, existing.url, record.url
            ),
            None => {}
        }
        records.insert(id.clone(), record.clone());
        Ok(())
    }

    async fn resolve(&self, id: &ArticleId) -> Result<ArticleRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))
    }

    async fn evict_older_than(&self, retention: Duration, now: DateTime<Utc>) -> Result<usize> {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return Ok(0);
        };
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.discovered_at >= cutoff);
        Ok(before - records.len())
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_core::Source;

    fn record(url: &str, discovered_at: DateTime<Utc>) -> ArticleRecord {
        ArticleRecord {
            title: "Weekly grain outlook".to_string(),
            url: url.to_string(),
            date_text: String::new(),
            published_at: None,
            source: Source::Admis,
            discovered_at,
        }
    }

    #[tokio::test]
    async fn test_memory_seen_store() {
        let store = MemorySeenStore::new();
        let id = ArticleId::derive(Source::Admis, "https://a.example/x");
        assert!(!store.contains(&id).await);
        store.mark_seen(&id).await.unwrap();
        assert!(store.contains(&id).await);
        store.mark_seen(&id).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_registry_resolve_and_evict() {
        let registry = MemoryArticleRegistry::new();
        let now = Utc::now();
        let old = record("https://a.example/old", now - Duration::days(40));
        let fresh = record("https://a.example/fresh", now);

        registry.register(&old.id(), &old).await.unwrap();
        registry.register(&fresh.id(), &fresh).await.unwrap();
        assert_eq!(registry.resolve(&fresh.id()).await.unwrap(), fresh);

        let evicted = registry.evict_older_than(Duration::days(30), now).await.unwrap();
        assert_eq!(evicted, 1);
        assert!(matches!(registry.resolve(&old.id()).await, Err(Error::NotFound(_))));
        assert_eq!(registry.resolve(&fresh.id()).await.unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_memory_registry_overwrites_on_collision() {
        let registry = MemoryArticleRegistry::new();
        let now = Utc::now();
        let first = record("https://a.example/x", now);
        let mut second = first.clone();
        second.title = "Different".to_string();

        registry.register(&first.id(), &first).await.unwrap();
        registry.register(&first.id(), &first).await.unwrap();
        assert_eq!(registry.len().await, 1);

        registry.register(&first.id(), &second).await.unwrap();
        assert_eq!(registry.resolve(&first.id()).await.unwrap().title, "Different");
    }

    #[tokio::test]
    async fn test_memory_registry_window_beyond_calendar() {
        let registry = MemoryArticleRegistry::new();
        let now = Utc::now();
        let kept = record("https://a.example/x", now);
        registry.register(&kept.id(), &kept).await.unwrap();

        let window = Duration::try_days(100_000_000).unwrap();
        assert_eq!(registry.evict_older_than(window, now).await.unwrap(), 0);
        assert_eq!(registry.len().await, 1);
    }
}
