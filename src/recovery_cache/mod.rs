//! Recovery Cache: last known good result per category
//!
//! Written after every successful extraction, read only when the whole
//! acquisition chain came up empty. Concurrent writers for the same category
//! resolve as last-writer-wins.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::ExtractionResult;
use crate::persistence::{result_path, serialize_result, write_atomic};

#[async_trait]
pub trait RecoveryCache: Send + Sync {
    async fn get(&self, category: &str) -> Result<Option<ExtractionResult>>;

    /// Unconditionally replace the entry for `category`
    async fn put(&self, category: &str, result: &ExtractionResult) -> Result<()>;
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryRecoveryCache {
    entries: DashMap<String, ExtractionResult>,
}

impl MemoryRecoveryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RecoveryCache for MemoryRecoveryCache {
    async fn get(&self, category: &str) -> Result<Option<ExtractionResult>> {
        Ok(self.entries.get(category).map(|entry| entry.value().clone()))
    }

    async fn put(&self, category: &str, result: &ExtractionResult) -> Result<()> {
        self.entries.insert(category.to_string(), result.clone());
        Ok(())
    }
}

/// One JSON file per category under a directory, surviving restarts
#[derive(Debug, Clone)]
pub struct FileRecoveryCache {
    dir: PathBuf,
}

impl FileRecoveryCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl RecoveryCache for FileRecoveryCache {
    async fn get(&self, category: &str) -> Result<Option<ExtractionResult>> {
        let path = result_path(&self.dir, category);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache entry for {category} at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(anyhow::anyhow!("Failed to read {}: {e}", path.display())),
        };
        let result = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("Corrupt cache entry {}: {e}", path.display()))?;
        Ok(Some(result))
    }

    async fn put(&self, category: &str, result: &ExtractionResult) -> Result<()> {
        let json = serialize_result(result).await?;
        write_atomic(&result_path(&self.dir, category), json.as_bytes()).await?;
        debug!("Cached {} records for {category}", result.records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use serde_json::json;

    fn result_with(rows: usize) -> ExtractionResult {
        let mut result = ExtractionResult::new("eleveurs", "https://example.org/eleveurs");
        result.records = (0..rows)
            .map(|i| {
                let mut record = Record::new();
                record.insert("Rang".into(), json!(i + 1));
                record
            })
            .collect();
        result
    }

    #[tokio::test]
    async fn memory_cache_overwrites() {
        let cache = MemoryRecoveryCache::new();
        assert!(cache.get("eleveurs").await.expect("get").is_none());
        cache.put("eleveurs", &result_with(2)).await.expect("put");
        cache.put("eleveurs", &result_with(5)).await.expect("put");
        let cached = cache.get("eleveurs").await.expect("get").expect("present");
        assert_eq!(cached.records.len(), 5);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn file_cache_round_trips_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        FileRecoveryCache::new(dir.path())
            .put("eleveurs", &result_with(3))
            .await
            .expect("put");

        let reopened = FileRecoveryCache::new(dir.path());
        let cached = reopened.get("eleveurs").await.expect("get").expect("present");
        assert_eq!(cached.records.len(), 3);
        assert!(reopened.get("jockeys").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("eleveurs.json"), b"{ not json").expect("write");
        let cache = FileRecoveryCache::new(dir.path());
        assert!(cache.get("eleveurs").await.is_err());
    }
}
