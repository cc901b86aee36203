use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rw_core::{ArticleRegistry, Error, Result, SeenStore, Source};
use tracing::info;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Json,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!(
                "Unknown storage backend: {}. Available: memory, json",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Everything the pipeline persists: one seen set per source and the registry.
pub struct Stores {
    pub seen: HashMap<Source, Arc<dyn SeenStore>>,
    pub registry: Arc<dyn ArticleRegistry>,
}

impl Stores {
    pub fn seen_for(&self, source: Source) -> Result<Arc<dyn SeenStore>> {
        self.seen
            .get(&source)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("No seen store opened for {}", source)))
    }
}

pub fn seen_path(data_dir: &Path, source: Source) -> PathBuf {
    data_dir.join("seen").join(format!("{}.json", source.key()))
}

pub fn registry_path(data_dir: &Path) -> PathBuf {
    data_dir.join("registry.json")
}

pub fn create_stores(kind: StorageKind, data_dir: &Path, sources: &[Source]) -> Stores {
    let mut seen: HashMap<Source, Arc<dyn SeenStore>> = HashMap::new();
    let registry: Arc<dyn ArticleRegistry> = match kind {
        StorageKind::Memory => {
            for source in sources {
                seen.insert(*source, Arc::new(MemorySeenStore::new()));
            }
            Arc::new(MemoryArticleRegistry::new())
        }
        StorageKind::Json => {
            for source in sources {
                seen.insert(*source, Arc::new(JsonSeenStore::open(seen_path(data_dir, *source))));
            }
            Arc::new(JsonArticleRegistry::open(registry_path(data_dir)))
        }
    };
    info!("💾 Storage ready ({} backend, {} sources)", kind, sources.len());
    Stores { seen, registry }
}
