//! Named response caches and their persistence.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::http::response::CachedResponse;
use crate::observability::metrics;

/// Storage seam used by strategies, the precache and the catch handler.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up `key` in the named cache. A miss is `None`, never an error.
    async fn lookup(&self, cache: &str, key: &str) -> Option<CachedResponse>;

    /// Insert or replace an entry.
    async fn put(&self, cache: &str, key: &str, response: CachedResponse);

    /// Remove an entry, returning whether it existed.
    async fn delete(&self, cache: &str, key: &str) -> bool;

    /// All keys currently held by the named cache.
    async fn keys(&self, cache: &str) -> Vec<String>;
}

type Snapshot = HashMap<String, HashMap<String, CachedResponse>>;

/// Concurrent in-memory cache store.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    caches: Arc<DashMap<String, DashMap<String, CachedResponse>>>,
    persistence_path: Option<PathBuf>,
}

impl InMemoryCacheStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            caches: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from a snapshot file if it exists; later saves go to the same file.
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;
            for (name, entries) in snapshot {
                store.caches.insert(name, entries.into_iter().collect());
            }
            tracing::info!(
                path = %path.display(),
                entries = store.total_entries(),
                "Loaded cache snapshot"
            );
        }
        Ok(store)
    }

    /// Write a snapshot if a persistence path is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let snapshot: Snapshot = self
            .caches
            .iter()
            .map(|cache| {
                let entries = cache
                    .value()
                    .iter()
                    .map(|e| (e.key().clone(), e.value().clone()))
                    .collect();
                (cache.key().clone(), entries)
            })
            .collect();

        // Written beside the target, then renamed over it.
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        tracing::info!(path = %path.display(), entries = self.total_entries(), "Saved cache snapshot");
        Ok(())
    }

    /// Entry count per cache name, sorted by name.
    pub fn summary(&self) -> Vec<(String, usize)> {
        let mut summary: Vec<_> = self
            .caches
            .iter()
            .map(|c| (c.key().clone(), c.value().len()))
            .collect();
        summary.sort();
        summary
    }

    pub fn total_entries(&self) -> usize {
        self.caches.iter().map(|c| c.value().len()).sum()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn lookup(&self, cache: &str, key: &str) -> Option<CachedResponse> {
        let hit = self
            .caches
            .get(cache)
            .and_then(|c| c.get(key).map(|e| e.value().clone()));
        metrics::record_cache_lookup(cache, hit.is_some());
        hit
    }

    async fn put(&self, cache: &str, key: &str, response: CachedResponse) {
        self.caches
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), response);
        metrics::record_cache_size(self.total_entries());
    }

    async fn delete(&self, cache: &str, key: &str) -> bool {
        let removed = self
            .caches
            .get(cache)
            .map(|c| c.remove(key).is_some())
            .unwrap_or(false);
        if removed {
            metrics::record_cache_size(self.total_entries());
        }
        removed
    }

    async fn keys(&self, cache: &str) -> Vec<String> {
        self.caches
            .get(cache)
            .map(|c| c.iter().map(|e| e.key().clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_lookup_delete() {
        let store = InMemoryCacheStore::default();
        assert!(store.lookup("runtime", "https://x.test/a").await.is_none());

        store
            .put("runtime", "https://x.test/a", CachedResponse::new(200, "a"))
            .await;
        let hit = store.lookup("runtime", "https://x.test/a").await.unwrap();
        assert_eq!(hit.body, b"a");

        // Caches are isolated by name.
        assert!(store.lookup("precache", "https://x.test/a").await.is_none());

        assert!(store.delete("runtime", "https://x.test/a").await);
        assert!(!store.delete("runtime", "https://x.test/a").await);
        assert!(store.keys("runtime").await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let store = InMemoryCacheStore::load_from_file(&path).unwrap();
        store
            .put("asset-link-runtime", "https://x.test/a", CachedResponse::new(200, "a"))
            .await;
        store
            .put("asset-link-precache-v2", "https://x.test/i", CachedResponse::new(200, "i"))
            .await;
        store.save_to_file().unwrap();

        let restored = InMemoryCacheStore::load_from_file(&path).unwrap();
        assert_eq!(restored.total_entries(), 2);
        assert_eq!(
            restored.summary(),
            vec![
                ("asset-link-precache-v2".to_string(), 1),
                ("asset-link-runtime".to_string(), 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_save_replaces_existing_snapshot_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{\"stale\":{}}").unwrap();

        let store = InMemoryCacheStore::load_from_file(&path).unwrap();
        store
            .put("asset-link-runtime", "https://x.test/a", CachedResponse::new(200, "a"))
            .await;
        store.save_to_file().unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("cache.json")]);

        let restored = InMemoryCacheStore::load_from_file(&path).unwrap();
        assert_eq!(
            restored.summary(),
            vec![("asset-link-runtime".to_string(), 1), ("stale".to_string(), 0)]
        );
    }

    #[test]
    fn test_save_without_path_is_noop() {
        let store = InMemoryCacheStore::default();
        assert!(store.save_to_file().is_ok());
    }
}
