//! Incremental Load Controller
//!
//! Ranking lists render the first page of rows and append more on each
//! "load more" click. The controller keeps clicking until the row count
//! stops growing, as a small state machine:
//!
//! - `Probing`: look for any load-more control; none means `Converged`
//! - `Expanding`: scroll, click, settle, recount rows
//! - `Converged`: `no_growth_threshold` consecutive attempts without growth
//! - `Exhausted`: the click cap was reached
//!
//! A missing control or a failed click counts like a click without growth.
//! Re-renders routinely detach the control for a moment; giving up on the
//! first miss would truncate the list.

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ActionLocator, RenderSession, default_load_more_locators};
use crate::table_locator::TableLocator;
use crate::utils::constants::{
    DEFAULT_MAX_CLICKS, DEFAULT_NO_GROWTH_THRESHOLD, DEFAULT_SETTLE_INTERVAL_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Probing,
    Expanding,
    Converged,
    Exhausted,
}

impl LoadState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Probing => "probing",
            Self::Expanding => "expanding",
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
        }
    }

    /// Both terminal states count as success
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMoreConfig {
    pub locators: Vec<ActionLocator>,
    /// `None` means unbounded
    pub max_clicks: Option<u32>,
    pub settle_interval: Duration,
    pub no_growth_threshold: u32,
}

impl Default for LoadMoreConfig {
    fn default() -> Self {
        Self {
            locators: default_load_more_locators(),
            max_clicks: Some(DEFAULT_MAX_CLICKS),
            settle_interval: Duration::from_millis(DEFAULT_SETTLE_INTERVAL_MS),
            no_growth_threshold: DEFAULT_NO_GROWTH_THRESHOLD,
        }
    }
}

/// What an expansion run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Successful clicks, growing or not
    pub clicks: u32,
    /// Clicks after which the row count strictly increased
    pub expansions: u32,
    pub state: LoadState,
}

#[derive(Debug, Clone, Default)]
pub struct IncrementalLoadController {
    config: LoadMoreConfig,
    locator: TableLocator,
}

impl IncrementalLoadController {
    #[must_use]
    pub fn new(config: LoadMoreConfig) -> Self {
        Self {
            config,
            locator: TableLocator::default(),
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: TableLocator) -> Self {
        self.locator = locator;
        self
    }

    #[must_use]
    pub fn config(&self) -> &LoadMoreConfig {
        &self.config
    }

    /// Rows of the candidate table in `html`, 0 when none is found
    #[must_use]
    pub fn count_rows(&self, html: &str) -> usize {
        let document = Html::parse_document(html);
        self.locator
            .locate(&document)
            .map_or(0, |node| node.row_count())
    }

    async fn current_rows(&self, session: &mut dyn RenderSession) -> Option<usize> {
        match session.current_html().await {
            Ok(html) => Some(self.count_rows(&html)),
            Err(e) => {
                warn!("Failed to read rendered document: {e}");
                None
            }
        }
    }

    /// Click "load more" until the table stops growing or the cap is hit
    pub async fn expand_fully(&self, session: &mut dyn RenderSession) -> LoadOutcome {
        let mut outcome = LoadOutcome {
            clicks: 0,
            expansions: 0,
            state: LoadState::Probing,
        };

        match session.find_clickable(&self.config.locators).await {
            Ok(Some(handle)) => {
                info!(locator = %handle.locator, "Load-more control found");
                outcome.state = LoadState::Expanding;
            }
            Ok(None) => {
                info!("No load-more control, nothing to expand");
                outcome.state = LoadState::Converged;
                return outcome;
            }
            Err(e) => {
                warn!("Load-more probe failed, treating list as complete: {e}");
                outcome.state = LoadState::Converged;
                return outcome;
            }
        }

        let mut failures = 0u32;
        while outcome.state == LoadState::Expanding {
            if self.config.max_clicks.is_some_and(|max| outcome.clicks >= max) {
                outcome.state = LoadState::Exhausted;
                break;
            }

            if !self.attempt(session, &mut outcome).await {
                failures += 1;
                debug!(failures, "Load-more attempt without growth");
                if failures >= self.config.no_growth_threshold {
                    outcome.state = LoadState::Converged;
                }
            } else {
                failures = 0;
            }
        }

        info!(
            clicks = outcome.clicks,
            expansions = outcome.expansions,
            state = %outcome.state,
            "Incremental load finished"
        );
        outcome
    }

    /// One scroll-click-settle-recount cycle; `true` when rows grew
    async fn attempt(&self, session: &mut dyn RenderSession, outcome: &mut LoadOutcome) -> bool {
        let Some(before) = self.current_rows(session).await else {
            return false;
        };

        let handle = match session.find_clickable(&self.config.locators).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                debug!("Load-more control not found this round");
                tokio::time::sleep(self.config.settle_interval).await;
                return false;
            }
            Err(e) => {
                debug!("Load-more lookup failed: {e}");
                tokio::time::sleep(self.config.settle_interval).await;
                return false;
            }
        };

        if let Err(e) = session.scroll_into_view(&handle).await {
            debug!("Scroll into view failed: {e}");
        }

        if let Err(e) = session.click(&handle).await {
            warn!(locator = %handle.locator, "Load-more click failed: {e}");
            if let Err(e) = session.dismiss_overlays().await {
                debug!("Overlay dismissal failed: {e}");
            }
            return false;
        }
        outcome.clicks += 1;

        tokio::time::sleep(self.config.settle_interval).await;

        let Some(after) = self.current_rows(session).await else {
            return false;
        };
        debug!(click = outcome.clicks, before, after, "Rows after click");

        if after > before {
            outcome.expansions += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ActionHandle;
    use anyhow::{Result, bail};
    use async_trait::async_trait;

    /// Table that gains `step` rows per click up to `limit`
    struct GrowingList {
        rows: usize,
        step: usize,
        limit: usize,
        control: bool,
        clicks: u32,
    }

    #[async_trait]
    impl RenderSession for GrowingList {
        async fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn current_html(&mut self) -> Result<String> {
            let rows: String = (0..self.rows)
                .map(|i| format!("<tr><td>{i}</td><td>x</td></tr>"))
                .collect();
            Ok(format!("<table>{rows}</table>"))
        }

        async fn find_clickable(&mut self, locators: &[ActionLocator]) -> Result<Option<ActionHandle>> {
            Ok(self.control.then(|| ActionHandle {
                locator: locators[0].clone(),
            }))
        }

        async fn click(&mut self, _handle: &ActionHandle) -> Result<()> {
            if !self.control {
                bail!("control detached");
            }
            self.clicks += 1;
            self.rows = (self.rows + self.step).min(self.limit);
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn controller(max_clicks: Option<u32>) -> IncrementalLoadController {
        IncrementalLoadController::new(LoadMoreConfig {
            max_clicks,
            settle_interval: Duration::ZERO,
            ..LoadMoreConfig::default()
        })
    }

    #[tokio::test]
    async fn no_control_converges_immediately() {
        let mut session = GrowingList {
            rows: 10,
            step: 10,
            limit: 100,
            control: false,
            clicks: 0,
        };
        let outcome = controller(None).expand_fully(&mut session).await;
        assert_eq!(outcome.state, LoadState::Converged);
        assert_eq!(outcome.clicks, 0);
    }

    #[tokio::test]
    async fn click_cap_exhausts() {
        let mut session = GrowingList {
            rows: 10,
            step: 10,
            limit: 1_000,
            control: true,
            clicks: 0,
        };
        let outcome = controller(Some(5)).expand_fully(&mut session).await;
        assert_eq!(outcome.state, LoadState::Exhausted);
        assert_eq!(outcome.clicks, 5);
        assert_eq!(outcome.expansions, 5);
        assert!(outcome.state.is_terminal());
    }

    #[tokio::test]
    async fn plateau_converges_after_three_flat_clicks() {
        let mut session = GrowingList {
            rows: 10,
            step: 10,
            limit: 50,
            control: true,
            clicks: 0,
        };
        let outcome = controller(None).expand_fully(&mut session).await;
        assert_eq!(outcome.expansions, 4);
        assert_eq!(outcome.clicks, 7);
        assert_eq!(outcome.state, LoadState::Converged);
    }
}
