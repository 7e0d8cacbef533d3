//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::ScrapeConfigBuilder;
use crate::fetch::RetryPolicy;
use crate::model::AcquisitionMethod;

impl<State> ScrapeConfigBuilder<State> {
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.draft.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.draft.retry = policy;
        self
    }

    /// Set browser headless mode.
    ///
    /// Headed mode is only honored in debug builds; release builds force
    /// headless and log a warning.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.draft.headless = headless;
        self
    }

    /// Send this user agent on every request instead of a random one
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.draft.user_agent = Some(user_agent.into());
        self
    }

    /// Cap on load-more clicks; `None` removes the cap
    #[must_use]
    pub fn max_clicks(mut self, max_clicks: Option<u32>) -> Self {
        self.draft.max_clicks = max_clicks;
        self
    }

    #[must_use]
    pub fn settle_interval_ms(mut self, ms: u64) -> Self {
        self.draft.settle_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn no_growth_threshold(mut self, threshold: u32) -> Self {
        self.draft.no_growth_threshold = threshold;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.draft.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn table_wait_secs(mut self, secs: u64) -> Self {
        self.draft.table_wait_secs = secs;
        self
    }

    #[must_use]
    pub fn strategy_order(mut self, order: Vec<AcquisitionMethod>) -> Self {
        self.draft.strategy_order = order;
        self
    }

    /// Enable or disable the browser-backed strategy
    #[must_use]
    pub fn use_browser(mut self, use_browser: bool) -> Self {
        self.draft.use_browser = use_browser;
        self
    }

    #[must_use]
    pub fn category_pause_ms(mut self, ms: u64) -> Self {
        self.draft.category_pause_ms = ms;
        self
    }

    #[must_use]
    pub fn max_concurrent_categories(mut self, n: usize) -> Self {
        self.draft.max_concurrent_categories = n;
        self
    }

    #[must_use]
    pub fn save_debug_snapshots(mut self, save: bool) -> Self {
        self.draft.save_debug_snapshots = save;
        self
    }

    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft.cache_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft.debug_dir = Some(dir.into());
        self
    }
}
