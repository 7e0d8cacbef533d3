//! Core configuration types for ranking extraction
//!
//! `ScrapeConfig` holds every tunable of a run: timeouts, the retry schedule,
//! the rendered-session settings, strategy order and output layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fetch::RetryPolicy;
use crate::model::AcquisitionMethod;
use crate::utils::constants::{
    DEFAULT_CATEGORY_PAUSE_MS, DEFAULT_MAX_CLICKS, DEFAULT_NAVIGATION_TIMEOUT_SECS,
    DEFAULT_NO_GROWTH_THRESHOLD, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SETTLE_INTERVAL_MS,
    DEFAULT_TABLE_WAIT_SECS,
};

/// Main configuration struct for an extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Where results are written.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) output_dir: PathBuf,

    /// Per-attempt timeout for every HTTP fetch
    pub(crate) request_timeout_secs: u64,
    pub(crate) retry: RetryPolicy,

    pub(crate) headless: bool,
    /// Fixed user agent; when unset each request picks one from the pool
    pub(crate) user_agent: Option<String>,

    /// Cap on load-more clicks; `None` is unbounded
    pub(crate) max_clicks: Option<u32>,
    pub(crate) settle_interval_ms: u64,
    pub(crate) no_growth_threshold: u32,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) table_wait_secs: u64,

    pub(crate) strategy_order: Vec<AcquisitionMethod>,
    /// Launch a browser for the rendered-session strategy
    pub(crate) use_browser: bool,

    /// Pause between categories when running sequentially
    pub(crate) category_pause_ms: u64,
    pub(crate) max_concurrent_categories: usize,

    pub(crate) save_debug_snapshots: bool,
    /// Defaults to `<output>/previous`
    pub(crate) cache_dir: Option<PathBuf>,
    /// Defaults to `<output>/debug`
    pub(crate) debug_dir: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
            headless: true,
            user_agent: None,
            max_clicks: Some(DEFAULT_MAX_CLICKS),
            settle_interval_ms: DEFAULT_SETTLE_INTERVAL_MS,
            no_growth_threshold: DEFAULT_NO_GROWTH_THRESHOLD,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            table_wait_secs: DEFAULT_TABLE_WAIT_SECS,
            strategy_order: AcquisitionMethod::DEFAULT_ORDER.to_vec(),
            use_browser: true,
            category_pause_ms: DEFAULT_CATEGORY_PAUSE_MS,
            max_concurrent_categories: 1,
            save_debug_snapshots: true,
            cache_dir: None,
            debug_dir: None,
        }
    }
}
