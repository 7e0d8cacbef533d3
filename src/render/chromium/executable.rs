//! Locate or download a Chrome/Chromium executable

use anyhow::{Context, Result};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Explicit executable path, checked before anything else
pub const BROWSER_ENV_VAR: &str = "TABLESCRAPE_BROWSER";

#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];
#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const INSTALL_PATHS: &[&str] = &["/opt/google/chrome/chrome", "/snap/bin/chromium"];

/// Binary names looked up on `PATH`
const PATH_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "chrome.exe",
];

/// First `names` entry present in one of `dirs`, directories searched in order
fn find_in_dirs<D: AsRef<Path>>(dirs: &[D], names: &[&str]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.as_ref().join(name)))
        .find(|candidate| candidate.is_file())
}

/// Chrome/Chromium already installed on this machine, if any
#[must_use]
pub fn find_browser_executable() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(BROWSER_ENV_VAR).map(PathBuf::from) {
        if path.is_file() {
            return Some(path);
        }
        debug!("{BROWSER_ENV_VAR} points to a missing file: {}", path.display());
    }

    let installed = INSTALL_PATHS.iter().map(PathBuf::from).find(|p| p.is_file());
    let per_user = dirs::data_local_dir()
        .map(|dir| dir.join("Google").join("Chrome").join("Application").join("chrome.exe"))
        .filter(|p| p.is_file());
    let on_path = std::env::var_os("PATH").and_then(|path| {
        let dirs: Vec<PathBuf> = std::env::split_paths(&path).collect();
        find_in_dirs(&dirs, PATH_NAMES)
    });

    installed.or(per_user).or(on_path)
}

/// Download a managed Chromium into the user cache directory
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tablescrape")
        .join("chromium");
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .context("Failed to create browser cache directory")?;

    info!("No local browser found, downloading Chromium into {}", cache_dir.display());
    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision = fetcher.fetch().await.context("Failed to download Chromium")?;
    Ok(revision.executable_path)
}

/// Local executable if one exists, else a freshly downloaded one
pub async fn resolve_browser_executable() -> Result<PathBuf> {
    match find_browser_executable() {
        Some(path) => {
            info!("Using browser at {}", path.display());
            Ok(path)
        }
        None => download_managed_browser().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_are_searched_in_order() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        std::fs::write(second.path().join("chromium"), b"").expect("write");
        std::fs::write(second.path().join("google-chrome"), b"").expect("write");

        let found = find_in_dirs(&[first.path(), second.path()], PATH_NAMES);
        assert_eq!(found, Some(second.path().join("chromium")));
    }

    #[test]
    fn directories_are_not_matches() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("chromium")).expect("mkdir");
        assert_eq!(find_in_dirs(&[dir.path()], &["chromium"]), None);
    }
}
