use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rw_core::{ArticleId, ArticleRecord, ArticleRegistry, Error, Result, SeenStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Reads a JSON document, treating a missing or unreadable file as empty.
fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No state at {}, starting empty", path.display());
            return T::default();
        }
        Err(e) => {
            warn!("Failed to read {}: {}; starting empty", path.display(), e);
            return T::default();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!("Corrupt state in {}: {}; starting empty", path.display(), e);
            T::default()
        }
    }
}

/// Write-fsync-rename so a crash never leaves a truncated file behind.
fn persist<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let storage_err = |e: std::io::Error| Error::Storage(format!("{}: {}", path.display(), e));

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(storage_err)?;

    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err)?;
    tmp.write_all(&bytes).map_err(storage_err)?;
    tmp.as_file().sync_all().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// Runs `persist` on the blocking pool with a snapshot of the state.
async fn persist_snapshot<T>(path: &Path, snapshot: T) -> Result<()>
where
    T: Serialize + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist(&path, &snapshot))
        .await
        .map_err(|e| Error::Storage(format!("write task aborted: {}", e)))?
}

/// Seen set for one source, stored as a JSON array of ids.
#[derive(Debug)]
pub struct JsonSeenStore {
    path: PathBuf,
    seen: Mutex<BTreeSet<ArticleId>>,
}

impl JsonSeenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let seen: BTreeSet<ArticleId> = load_or_default(&path);
        debug!("Loaded {} seen ids from {}", seen.len(), path.display());
        Self {
            path,
            seen: Mutex::new(seen),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SeenStore for JsonSeenStore {
    async fn contains(&self, id: &ArticleId) -> bool {
        self.seen.lock().await.contains(id)
    }

    async fn mark_seen(&self, id: &ArticleId) -> Result<()> {
        let mut seen = self.seen.lock().await;
        if !seen.insert(id.clone()) {
            return Ok(());
        }
        if let Err(e) = persist_snapshot(&self.path, seen.clone()).await {
            seen.remove(id);
            return Err(e);
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }
}

/// Pending articles keyed by id, stored as one JSON object.
#[derive(Debug)]
pub struct JsonArticleRegistry {
    path: PathBuf,
    records: Mutex<BTreeMap<ArticleId, ArticleRecord>>,
}

impl JsonArticleRegistry {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records: BTreeMap<ArticleId, ArticleRecord> = load_or_default(&path);
        debug!("Loaded {} pending articles from {}", records.len(), path.display());
        Self {
            path,
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl ArticleRegistry for JsonArticleRegistry {
    async fn register(&self, id: &ArticleId, record: &ArticleRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        let previous = match records.get(id) {
            Some(existing) if existing == record => return Ok(()),
            Some(existing) if existing.url == record.url => {
                debug!("Refreshing article {}", id);
                Some(existing.clone())
            }
            Some(existing) => {
                warn!(
                    "Article id collision for {}: replacing {} with {}",
                    id, existing.url, record.url
                );
                Some(existing.clone())
            }
            None => None,
        };

        records.insert(id.clone(), record.clone());
        if let Err(e) = persist_snapshot(&self.path, records.clone()).await {
            match previous {
                Some(previous) => records.insert(id.clone(), previous),
                None => records.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn resolve(&self, id: &ArticleId) -> Result<ArticleRecord> {
        self.records
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))
    }

    async fn evict_older_than(&self, retention: Duration, now: DateTime<Utc>) -> Result<usize> {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return Ok(0);
        };
        let mut records = self.records.lock().await;
        let mut kept = records.clone();
        kept.retain(|_, record| record.discovered_at >= cutoff);

        let evicted = records.len() - kept.len();
        if evicted > 0 {
            persist_snapshot(&self.path, kept.clone()).await?;
            *records = kept;
        }
        Ok(evicted)
    }

    async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}
