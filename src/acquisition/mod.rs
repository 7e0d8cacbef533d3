//! Acquisition Strategy Chain
//!
//! Tries each acquisition method in order until one produces records:
//! static parse, file download, embedded payload, rendered session. Each
//! strategy fetches its own document; nothing is shared between them.
//! Strategy errors are logged and recorded as diagnostics, never
//! propagated. When every strategy comes up empty the recovery cache is
//! consulted, and only when that is empty too does the result carry an
//! error.

pub mod delimited;
pub mod embedded_payload;
pub mod error;
pub mod file_download;
pub mod rendered;
pub mod static_parse;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::diagnostics::{DiagnosticSink, NoopDiagnosticSink};
use crate::fetch::{FetchRequest, Fetcher, RetryPolicy, fetch_document, request_headers};
use crate::model::{
    AcquisitionMethod, Category, ExtractionMetadata, ExtractionResult, RawDocument, Record,
    StrategyDiagnostic, StrategyOutcome,
};
use crate::recovery_cache::{MemoryRecoveryCache, RecoveryCache};
use crate::render::{LoadMoreConfig, Renderer, SessionOptions};
use crate::table_locator::TableLocator;
use crate::utils::constants::DEFAULT_REQUEST_TIMEOUT_SECS;

pub use error::{AcquisitionError, FailureKind};

/// What one strategy produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    pub records: Vec<Record>,
    pub filters: serde_json::Map<String, serde_json::Value>,
    /// Strategy-specific metadata; the chain fills in method and counts
    pub metadata: ExtractionMetadata,
}

/// Collaborators and settings shared by every strategy
pub struct AcquisitionContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub renderer: Option<Arc<dyn Renderer>>,
    pub sink: Arc<dyn DiagnosticSink>,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// Fixed user agent; a random one per request when unset
    pub user_agent: Option<String>,
    pub locator: TableLocator,
    pub load_more: LoadMoreConfig,
    pub session: SessionOptions,
}

impl AcquisitionContext {
    /// Context with default settings, no renderer and no snapshots
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            renderer: None,
            sink: Arc::new(NoopDiagnosticSink),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: None,
            locator: TableLocator::default(),
            load_more: LoadMoreConfig::default(),
            session: SessionOptions::default(),
        }
    }

    #[must_use]
    pub fn headers(&self, referer: Option<&str>) -> Vec<(String, String)> {
        request_headers(self.user_agent.as_deref(), referer)
    }

    /// Fetch with retry and backoff
    pub async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, AcquisitionError> {
        Ok(fetch_document(self.fetcher.as_ref(), &self.retry, request).await?)
    }

    /// Fetch a category's entry page
    pub async fn fetch_entry(&self, url: &str) -> Result<RawDocument, AcquisitionError> {
        let request =
            FetchRequest::new(url, self.request_timeout).with_headers(self.headers(None));
        self.fetch(&request).await
    }
}

/// Ordered strategies plus the recovery cache
pub struct AcquisitionChain {
    ctx: AcquisitionContext,
    order: Vec<AcquisitionMethod>,
    cache: Arc<dyn RecoveryCache>,
}

impl AcquisitionChain {
    /// Chain in default order with a process-local cache
    #[must_use]
    pub fn new(ctx: AcquisitionContext) -> Self {
        Self {
            ctx,
            order: AcquisitionMethod::DEFAULT_ORDER.to_vec(),
            cache: Arc::new(MemoryRecoveryCache::new()),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: Vec<AcquisitionMethod>) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn RecoveryCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn context(&self) -> &AcquisitionContext {
        &self.ctx
    }

    #[must_use]
    pub fn order(&self) -> &[AcquisitionMethod] {
        &self.order
    }

    async fn run_strategy(
        &self,
        method: AcquisitionMethod,
        category: &Category,
    ) -> Option<Result<StrategyOutput, AcquisitionError>> {
        let attempt = match method {
            AcquisitionMethod::StaticParse => static_parse::acquire(&self.ctx, category).await,
            AcquisitionMethod::FileDownload => file_download::acquire(&self.ctx, category).await,
            AcquisitionMethod::EmbeddedPayload => {
                embedded_payload::acquire(&self.ctx, category).await
            }
            AcquisitionMethod::RenderedSession => {
                let renderer = self.ctx.renderer.as_ref()?;
                rendered::acquire(&self.ctx, renderer.as_ref(), category).await
            }
        };
        Some(attempt)
    }

    /// Acquire records for `category`. Never fails: total failure is a
    /// result with no records and an error.
    pub async fn acquire(&self, category: &Category) -> ExtractionResult {
        let mut diagnostics = Vec::new();

        for &method in &self.order {
            info!(category = %category.name, method = %method, "Trying strategy");

            let diagnostic = |outcome, message: String| StrategyDiagnostic {
                method,
                outcome,
                message,
            };

            match self.run_strategy(method, category).await {
                None => {
                    info!(category = %category.name, method = %method, "Strategy skipped, no renderer");
                    diagnostics.push(diagnostic(
                        StrategyOutcome::Skipped,
                        "no renderer configured".to_string(),
                    ));
                }
                Some(Ok(output)) if !output.records.is_empty() => {
                    let result = self.build_result(category, method, output, diagnostics);
                    info!(
                        category = %category.name,
                        method = %method,
                        records = result.records.len(),
                        "Strategy succeeded"
                    );
                    if let Err(e) = self.cache.put(&category.name, &result).await {
                        warn!(category = %category.name, "Failed to update recovery cache: {e:#}");
                    }
                    return result;
                }
                Some(Ok(_)) => {
                    info!(category = %category.name, method = %method, "Strategy produced no records");
                    diagnostics.push(diagnostic(
                        StrategyOutcome::Empty,
                        "no records produced".to_string(),
                    ));
                }
                Some(Err(e)) => {
                    let kind = e.kind();
                    warn!(category = %category.name, method = %method, %kind, "Strategy failed: {e}");
                    diagnostics.push(diagnostic(StrategyOutcome::Failed, format!("{kind}: {e}")));
                }
            }
        }

        self.recover(category, diagnostics).await
    }

    fn build_result(
        &self,
        category: &Category,
        method: AcquisitionMethod,
        output: StrategyOutput,
        diagnostics: Vec<StrategyDiagnostic>,
    ) -> ExtractionResult {
        let mut result = ExtractionResult::new(&category.name, &category.url);
        result.metadata = ExtractionMetadata {
            method: Some(method),
            row_count: output.records.len(),
            diagnostics,
            ..output.metadata
        };
        result.filters = output.filters;
        result.records = output.records;
        result
    }

    async fn recover(
        &self,
        category: &Category,
        diagnostics: Vec<StrategyDiagnostic>,
    ) -> ExtractionResult {
        let cached = match self.cache.get(&category.name).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(category = %category.name, "Recovery cache read failed: {e:#}");
                None
            }
        };

        match cached {
            Some(mut result) if !result.records.is_empty() => {
                warn!(
                    category = %category.name,
                    records = result.records.len(),
                    "All strategies failed, serving cached result"
                );
                result.mark_recovered(Utc::now());
                result.metadata.error = None;
                result.metadata.diagnostics = diagnostics;
                result
            }
            _ => {
                let error = format!(
                    "all {} acquisition strategies failed and no cached result exists",
                    self.order.len()
                );
                warn!(category = %category.name, "{error}");
                ExtractionResult::failed(&category.name, &category.url, error, diagnostics)
            }
        }
    }
}
