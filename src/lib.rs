pub mod acquisition;
pub mod config;
pub mod diagnostics;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod page_filters;
pub mod persistence;
pub mod pipeline;
pub mod recovery_cache;
pub mod render;
pub mod row_extractor;
pub mod table_locator;
pub mod utils;

pub use acquisition::{
    AcquisitionChain, AcquisitionContext, AcquisitionError, FailureKind, StrategyOutput,
};
pub use config::ScrapeConfig;
pub use diagnostics::{DiagnosticSink, FileDiagnosticSink, NoopDiagnosticSink};
pub use fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, ReqwestFetcher, RetryPolicy};
pub use model::{
    AcquisitionMethod, Category, ExtractionMetadata, ExtractionResult, Record, Scalar,
};
pub use normalize::normalize;
pub use pipeline::{CategoryReport, Pipeline, RunSummary};
pub use recovery_cache::{FileRecoveryCache, MemoryRecoveryCache, RecoveryCache};
pub use render::{
    ChromiumRenderer, IncrementalLoadController, LoadMoreConfig, RenderSession, Renderer,
    SessionOptions,
};
pub use table_locator::{LocatorStrategy, TableLocator};

/// Run the full pipeline for `categories` with production collaborators
pub async fn run(
    config: &ScrapeConfig,
    categories: &[Category],
) -> anyhow::Result<RunSummary> {
    let pipeline = Pipeline::from_config(config)?;
    Ok(pipeline.run(categories).await)
}
