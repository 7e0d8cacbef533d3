//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! The output directory is the only required field; `build()` is not
//! callable until it has been set.

use anyhow::{Result, anyhow, bail};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::ScrapeConfig;

// Type states for the builder
pub struct WithOutputDir;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) draft: ScrapeConfig,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            draft: ScrapeConfig::default(),
            output_dir: None,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }

    /// Builder seeded from an existing configuration, e.g. one read from a file
    #[must_use]
    pub fn rebuild(self) -> ScrapeConfigBuilder<WithOutputDir> {
        ScrapeConfigBuilder {
            output_dir: Some(self.output_dir.clone()),
            draft: self,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn output_dir(self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithOutputDir> {
        ScrapeConfigBuilder {
            draft: self.draft,
            output_dir: Some(dir.into()),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<WithOutputDir> {
    /// Replace the output directory
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<ScrapeConfig> {
        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output_dir is required"))?;
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            std::env::current_dir()
                .map_err(|e| anyhow!("Cannot resolve output directory: {e}"))?
                .join(output_dir)
        };

        let draft = self.draft;

        if draft.strategy_order.is_empty() {
            bail!("strategy order must name at least one acquisition method");
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = draft.strategy_order.iter().find(|m| !seen.insert(**m)) {
            bail!("acquisition method '{duplicate}' appears twice in the strategy order");
        }
        if draft.max_concurrent_categories == 0 {
            bail!("max_concurrent_categories must be at least 1");
        }
        if draft.no_growth_threshold == 0 {
            bail!("no_growth_threshold must be at least 1");
        }
        if draft.retry.attempts == 0 {
            bail!("retry attempts must be at least 1");
        }

        // Enforce headless mode in release builds
        #[cfg(not(debug_assertions))]
        let headless = {
            if !draft.headless {
                tracing::warn!(
                    "Forcing headless mode in release build. \
                    Headed mode is only available in debug builds for development."
                );
            }
            true
        };

        #[cfg(debug_assertions)]
        let headless = draft.headless;

        Ok(ScrapeConfig {
            output_dir,
            headless,
            ..draft
        })
    }
}
