//! Multi-category runs
//!
//! Each category runs its acquisition chain to completion and is persisted
//! before it counts as done. Categories share nothing but the recovery
//! cache, so they may run concurrently; a failed category never stops the
//! run.

use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::acquisition::{AcquisitionChain, AcquisitionContext};
use crate::config::ScrapeConfig;
use crate::diagnostics::{DiagnosticSink, FileDiagnosticSink, NoopDiagnosticSink};
use crate::fetch::ReqwestFetcher;
use crate::model::{AcquisitionMethod, Category, ExtractionResult};
use crate::persistence::save_extraction_result;
use crate::recovery_cache::FileRecoveryCache;
use crate::render::ChromiumRenderer;

/// Per-category line of a run summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub success: bool,
    pub record_count: usize,
    pub method: Option<AcquisitionMethod>,
    pub recovered: bool,
    pub error: Option<String>,
    pub output_path: Option<PathBuf>,
}

impl CategoryReport {
    #[must_use]
    pub fn from_result(result: &ExtractionResult) -> Self {
        Self {
            category: result.category.clone(),
            success: result.is_success(),
            record_count: result.records.len(),
            method: result.metadata.method,
            recovered: result.metadata.recovered,
            error: result.metadata.error.clone(),
            output_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub reports: Vec<CategoryReport>,
}

impl RunSummary {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.success).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    #[must_use]
    pub fn total_records(&self) -> usize {
        self.reports.iter().map(|r| r.record_count).sum()
    }

    pub fn log(&self) {
        for report in &self.reports {
            let method = report.method.map_or("none", AcquisitionMethod::label);
            if report.success {
                info!(
                    category = %report.category,
                    records = report.record_count,
                    method,
                    recovered = report.recovered,
                    "✓ {}",
                    report.category
                );
            } else {
                warn!(
                    category = %report.category,
                    error = report.error.as_deref().unwrap_or("unknown"),
                    "✗ {}",
                    report.category
                );
            }
        }
        info!(
            succeeded = self.succeeded(),
            failed = self.failed(),
            records = self.total_records(),
            "Run finished"
        );
    }
}

pub struct Pipeline {
    chain: AcquisitionChain,
    output_dir: PathBuf,
    category_pause: Duration,
    max_concurrent: usize,
}

impl Pipeline {
    #[must_use]
    pub fn new(chain: AcquisitionChain, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            chain,
            output_dir: output_dir.into(),
            category_pause: Duration::ZERO,
            max_concurrent: 1,
        }
    }

    #[must_use]
    pub fn with_category_pause(mut self, pause: Duration) -> Self {
        self.category_pause = pause;
        self
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Wire the production collaborators: reqwest fetcher, chromium renderer
    /// when enabled, file-backed cache and snapshots
    pub fn from_config(config: &ScrapeConfig) -> Result<Self> {
        let sink: Arc<dyn DiagnosticSink> = if config.save_debug_snapshots() {
            Arc::new(FileDiagnosticSink::new(config.debug_dir()))
        } else {
            Arc::new(NoopDiagnosticSink)
        };

        let mut ctx = AcquisitionContext::new(Arc::new(ReqwestFetcher::new()?));
        ctx.sink = sink;
        ctx.retry = config.retry();
        ctx.request_timeout = config.request_timeout();
        ctx.user_agent = config.user_agent().map(str::to_string);
        ctx.load_more = config.load_more();
        ctx.session = config.session_options();
        if config.use_browser() {
            ctx.renderer = Some(Arc::new(ChromiumRenderer::new()));
        }

        let chain = AcquisitionChain::new(ctx)
            .with_order(config.strategy_order().to_vec())
            .with_cache(Arc::new(FileRecoveryCache::new(config.cache_dir())));

        Ok(Self::new(chain, config.output_dir())
            .with_category_pause(config.category_pause())
            .with_max_concurrent(config.max_concurrent_categories()))
    }

    #[must_use]
    pub fn chain(&self) -> &AcquisitionChain {
        &self.chain
    }

    /// Acquire and persist one category
    pub async fn run_category(&self, category: &Category) -> CategoryReport {
        info!(category = %category.name, url = %category.url, "Processing category");
        let result = self.chain.acquire(category).await;
        let mut report = CategoryReport::from_result(&result);

        match save_extraction_result(&result, &self.output_dir).await {
            Ok(path) => report.output_path = Some(path),
            Err(e) => {
                error!(category = %category.name, "Failed to save result: {e:#}");
                if report.error.is_none() {
                    report.error = Some(format!("save failed: {e:#}"));
                }
            }
        }
        report
    }

    /// Run every category; reports keep the input order
    pub async fn run(&self, categories: &[Category]) -> RunSummary {
        let reports = if self.max_concurrent <= 1 {
            self.run_sequential(categories).await
        } else {
            self.run_concurrent(categories).await
        };
        RunSummary { reports }
    }

    async fn run_sequential(&self, categories: &[Category]) -> Vec<CategoryReport> {
        let mut reports = Vec::with_capacity(categories.len());
        for (index, category) in categories.iter().enumerate() {
            if index > 0 && !self.category_pause.is_zero() {
                tokio::time::sleep(self.category_pause).await;
            }
            reports.push(self.run_category(category).await);
        }
        reports
    }

    async fn run_concurrent(&self, categories: &[Category]) -> Vec<CategoryReport> {
        let semaphore = Semaphore::new(self.max_concurrent);
        let runs = categories.iter().map(|category| {
            let semaphore = &semaphore;
            async move {
                match semaphore.acquire().await {
                    Ok(_permit) => self.run_category(category).await,
                    Err(e) => {
                        // Only reachable if the semaphore is closed
                        error!(category = %category.name, "Semaphore error: {e}");
                        let result = ExtractionResult::failed(
                            &category.name,
                            &category.url,
                            format!("not scheduled: {e}"),
                            Vec::new(),
                        );
                        CategoryReport::from_result(&result)
                    }
                }
            }
        });
        join_all(runs).await
    }
}
