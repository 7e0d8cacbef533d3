//! JSON persistence of extraction results
//!
//! Output is pretty-printed with keys in insertion order, so records keep
//! column order and integers stay distinct from floats and strings.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::model::ExtractionResult;

/// Timeout for blocking JSON serialization
const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Serialize a result off the async runtime
pub async fn serialize_result(result: &ExtractionResult) -> Result<String> {
    let owned = result.clone();
    let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&owned));

    match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
        Ok(Ok(json)) => Ok(json?),
        Ok(Err(e)) => Err(anyhow::anyhow!("JSON serialization task panicked: {e}")),
        Err(_) => {
            log::warn!("JSON serialization timeout (timeout: {BLOCKING_SERIALIZATION_TIMEOUT:?})");
            Err(anyhow::anyhow!(
                "JSON serialization timed out after {BLOCKING_SERIALIZATION_TIMEOUT:?}"
            ))
        }
    }
}

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a partial file
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?;
    tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Path has no file name"))?
        .to_string_lossy();
    let tmp = parent.join(format!(".{file_name}.{}.tmp", rand::random::<u32>()));

    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(anyhow::anyhow!("Failed to move {} into place: {e}", path.display()));
    }
    Ok(())
}

/// `<dir>/<category>.json`, with the category name made filesystem-safe
#[must_use]
pub fn result_path(dir: &Path, category: &str) -> PathBuf {
    dir.join(sanitize_filename::sanitize(format!("{category}.json")))
}

/// Persist `result` as `<output_dir>/<category>.json`
pub async fn save_extraction_result(result: &ExtractionResult, output_dir: &Path) -> Result<PathBuf> {
    let json = serialize_result(result).await?;
    let path = result_path(output_dir, &result.category);
    write_atomic(&path, json.as_bytes()).await?;
    log::info!(
        "Saved {} records for {} to {}",
        result.records.len(),
        result.category,
        path.display()
    );
    Ok(path)
}

/// Read a result previously written by `save_extraction_result`
pub async fn load_extraction_result(path: &Path) -> Result<ExtractionResult> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid result file {}", path.display()))
}
