// Ranking extraction CLI
//
// Runs the acquisition chain over every configured category and writes one
// JSON file per category into the output directory.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use tablescrape::config::{
    ScrapeConfig, default_categories, load_categories, load_config, select_categories,
};
use tablescrape::model::AcquisitionMethod;
use tablescrape::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "tablescrape",
    about = "Extract ranking tables from unstable, script-rendered pages",
    version
)]
struct Cli {
    /// Comma-separated category names to process (default: all).
    #[arg(short, long)]
    categories: Option<String>,

    /// JSON category list `[{"name": ..., "url": ...}]`.
    #[arg(long)]
    category_file: Option<PathBuf>,

    /// JSON config file; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for results.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum load-more clicks per category (0 = unbounded).
    #[arg(long)]
    max_clicks: Option<u32>,

    /// Comma-separated strategy order, e.g. `static,download,payload,rendered`.
    #[arg(long)]
    strategies: Option<String>,

    /// Skip the browser-backed strategy.
    #[arg(long)]
    no_browser: bool,

    /// Show the browser window (debug builds only).
    #[arg(long)]
    headed: bool,

    /// Categories processed at the same time.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_strategies(list: &str) -> Result<Vec<AcquisitionMethod>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            AcquisitionMethod::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown acquisition method '{name}'"))
        })
        .collect()
}

async fn resolve_config(cli: &Cli) -> Result<ScrapeConfig> {
    let base = match &cli.config {
        Some(path) => load_config(path).await?,
        None => ScrapeConfig::builder().output_dir("data").build()?,
    };

    let mut builder = base.rebuild();
    if let Some(output) = &cli.output {
        builder = builder.output_dir(output);
    }
    if let Some(clicks) = cli.max_clicks {
        builder = builder.max_clicks((clicks > 0).then_some(clicks));
    }
    if let Some(list) = &cli.strategies {
        let order = parse_strategies(list)?;
        if order.is_empty() {
            bail!("--strategies must name at least one method");
        }
        builder = builder.strategy_order(order);
    }
    if cli.no_browser {
        builder = builder.use_browser(false);
    }
    if cli.headed {
        builder = builder.headless(false);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.max_concurrent_categories(n);
    }
    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli).await?;

    let categories = match &cli.category_file {
        Some(path) => load_categories(path).await?,
        None => default_categories(),
    };
    let categories = select_categories(categories, cli.categories.as_deref());

    tracing::info!(
        categories = categories.len(),
        output = %config.output_dir().display(),
        "Starting extraction"
    );

    let pipeline = Pipeline::from_config(&config)?;
    let summary = pipeline.run(&categories).await;
    summary.log();

    if summary.succeeded() == 0 && !summary.reports.is_empty() {
        bail!("No category produced any records");
    }
    Ok(())
}
