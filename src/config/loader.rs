//! Category lists and configuration files
//!
//! Both are plain JSON. A category file is `[{"name": ..., "url": ...}]`;
//! a config file is a partial `ScrapeConfig` where missing keys take their
//! defaults.

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::types::ScrapeConfig;
use crate::model::Category;

const FRANCE_GALOP_RANKINGS: [(&str, &str); 5] = [
    ("chevaux", "https://www.france-galop.com/fr/hommes-chevaux/chevaux"),
    ("proprietaires", "https://www.france-galop.com/fr/hommes-chevaux/proprietaires"),
    ("entraineurs", "https://www.france-galop.com/fr/hommes-chevaux/entraineurs"),
    ("eleveurs", "https://www.france-galop.com/fr/hommes-chevaux/eleveurs"),
    ("jockeys", "https://www.france-galop.com/fr/hommes-chevaux/jockeys"),
];

/// Built-in category list: the five France Galop rankings
#[must_use]
pub fn default_categories() -> Vec<Category> {
    FRANCE_GALOP_RANKINGS
        .iter()
        .map(|(name, url)| Category::new(*name, *url))
        .collect()
}

/// Parse a category list, rejecting blank names and duplicates
pub fn parse_categories(json: &str) -> Result<Vec<Category>> {
    let categories: Vec<Category> =
        serde_json::from_str(json).context("Category list is not a JSON array of {name, url}")?;

    let mut seen = HashSet::new();
    for category in &categories {
        if category.name.trim().is_empty() {
            bail!("Category with URL '{}' has an empty name", category.url);
        }
        if !seen.insert(category.name.as_str()) {
            bail!("Category '{}' is listed twice", category.name);
        }
    }
    Ok(categories)
}

pub async fn load_categories(path: &Path) -> Result<Vec<Category>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read category list {}", path.display()))?;
    let categories = parse_categories(&json)?;
    info!(path = %path.display(), count = categories.len(), "Loaded categories");
    Ok(categories)
}

/// Keep the categories named in a comma-separated `filter`.
///
/// Unknown names are ignored with a warning; an empty selection keeps all.
#[must_use]
pub fn select_categories(categories: Vec<Category>, filter: Option<&str>) -> Vec<Category> {
    let wanted: Vec<&str> = filter
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    for name in &wanted {
        if !categories.iter().any(|c| c.name == *name) {
            warn!("Unknown category '{name}' ignored");
        }
    }

    let selected: Vec<Category> = categories
        .iter()
        .filter(|c| wanted.contains(&c.name.as_str()))
        .cloned()
        .collect();

    if selected.is_empty() { categories } else { selected }
}

/// Read a JSON config file and validate it through the builder
pub async fn load_config(path: &Path) -> Result<ScrapeConfig> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ScrapeConfig = serde_json::from_str(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.rebuild().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_list_five_rankings() {
        let categories = default_categories();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0].name, "chevaux");
        assert!(categories.iter().all(|c| c.url.starts_with("https://")));
    }

    #[test]
    fn selection_ignores_unknown_names() {
        let selected = select_categories(default_categories(), Some("jockeys, licornes"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "jockeys");

        assert_eq!(select_categories(default_categories(), Some("licornes")).len(), 5);
        assert_eq!(select_categories(default_categories(), None).len(), 5);
    }

    #[test]
    fn duplicate_category_names_are_rejected() {
        let json = r#"[{"name":"a","url":"https://x/1"},{"name":"a","url":"https://x/2"}]"#;
        assert!(parse_categories(json).is_err());
    }

    #[tokio::test]
    async fn partial_config_file_takes_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let output = dir.path().join("out");
        let json = serde_json::json!({
            "output_dir": output,
            "max_clicks": null,
            "category_pause_ms": 0
        });
        tokio::fs::write(&path, json.to_string()).await.expect("write");

        let config = load_config(&path).await.expect("config");
        assert_eq!(config.output_dir(), output.as_path());
        assert_eq!(config.max_clicks(), None);
        assert_eq!(config.request_timeout_secs(), 30);
    }
}
