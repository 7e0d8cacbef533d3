//! Diagnostic sink for raw document snapshots
//!
//! Snapshots are keyed by category plus a suffix (`_page.html`,
//! `_notfound.html`, `_download.csv`, `_rendered.html`). Writing one is
//! fire-and-forget: failures are logged and never reach the pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn record(&self, category: &str, suffix: &str, content: &[u8]);
}

/// Discards every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnosticSink;

#[async_trait]
impl DiagnosticSink for NoopDiagnosticSink {
    async fn record(&self, _category: &str, _suffix: &str, _content: &[u8]) {}
}

/// Writes snapshots as files under one directory, overwriting older ones
#[derive(Debug, Clone)]
pub struct FileDiagnosticSink {
    dir: PathBuf,
}

impl FileDiagnosticSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a snapshot for `category` and `suffix` is written to
    #[must_use]
    pub fn snapshot_path(&self, category: &str, suffix: &str) -> PathBuf {
        self.dir
            .join(sanitize_filename::sanitize(format!("{category}{suffix}")))
    }
}

#[async_trait]
impl DiagnosticSink for FileDiagnosticSink {
    async fn record(&self, category: &str, suffix: &str, content: &[u8]) {
        let path = self.snapshot_path(category, suffix);
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("Failed to create diagnostics directory {}: {e}", self.dir.display());
            return;
        }
        match tokio::fs::write(&path, content).await {
            Ok(()) => debug!("Saved diagnostic snapshot {}", path.display()),
            Err(e) => warn!("Failed to save diagnostic snapshot {}: {e}", path.display()),
        }
    }
}
