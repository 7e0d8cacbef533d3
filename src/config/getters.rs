//! Getter methods for `ScrapeConfig`
//!
//! Raw seconds and milliseconds are exposed as `Duration`s; the collaborator
//! settings (`SessionOptions`, `LoadMoreConfig`) are assembled here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::ScrapeConfig;
use crate::fetch::RetryPolicy;
use crate::model::AcquisitionMethod;
use crate::render::{LoadMoreConfig, SessionOptions};

impl ScrapeConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    #[must_use]
    pub fn max_clicks(&self) -> Option<u32> {
        self.max_clicks
    }

    #[must_use]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    #[must_use]
    pub fn no_growth_threshold(&self) -> u32 {
        self.no_growth_threshold
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn table_wait(&self) -> Duration {
        Duration::from_secs(self.table_wait_secs)
    }

    #[must_use]
    pub fn strategy_order(&self) -> &[AcquisitionMethod] {
        &self.strategy_order
    }

    #[must_use]
    pub fn use_browser(&self) -> bool {
        self.use_browser
    }

    #[must_use]
    pub fn category_pause(&self) -> Duration {
        Duration::from_millis(self.category_pause_ms)
    }

    #[must_use]
    pub fn max_concurrent_categories(&self) -> usize {
        self.max_concurrent_categories
    }

    #[must_use]
    pub fn save_debug_snapshots(&self) -> bool {
        self.save_debug_snapshots
    }

    /// Recovery cache directory, `<output>/previous` unless overridden
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("previous"))
    }

    /// Snapshot directory, `<output>/debug` unless overridden
    #[must_use]
    pub fn debug_dir(&self) -> PathBuf {
        self.debug_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("debug"))
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            headless: self.headless,
            user_agent: self.user_agent.clone(),
            navigation_timeout: self.navigation_timeout(),
            table_wait: self.table_wait(),
        }
    }

    #[must_use]
    pub fn load_more(&self) -> LoadMoreConfig {
        LoadMoreConfig {
            max_clicks: self.max_clicks,
            settle_interval: self.settle_interval(),
            no_growth_threshold: self.no_growth_threshold,
            ..LoadMoreConfig::default()
        }
    }
}
