//! Rendered Session strategy: drive a browser, expand the list, extract
//!
//! The session is closed on every exit path. A failed close is logged and
//! never masks the strategy's own outcome.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::error::AcquisitionError;
use super::static_parse::extract_or_snapshot;
use super::{AcquisitionContext, StrategyOutput};
use crate::model::Category;
use crate::render::{IncrementalLoadController, LoadOutcome, RenderSession, Renderer};

const TABLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn acquire(
    ctx: &AcquisitionContext,
    renderer: &dyn Renderer,
    category: &Category,
) -> Result<StrategyOutput, AcquisitionError> {
    let mut session = renderer
        .open_session(&ctx.session)
        .await
        .map_err(|e| AcquisitionError::render(&e))?;

    let rendered = drive(ctx, session.as_mut(), category).await;

    if let Err(e) = session.close().await {
        warn!(category = %category.name, "Failed to close rendering session: {e:#}");
    }

    let (html, outcome, page_url) = rendered?;
    ctx.sink
        .record(&category.name, "_rendered.html", html.as_bytes())
        .await;

    let mut output = extract_or_snapshot(ctx, category, &html, &page_url).await?;
    output.metadata.expansion_clicks = Some(outcome.clicks);
    output.metadata.expansions = Some(outcome.expansions);
    output.metadata.load_state = Some(outcome.state.to_string());
    info!(
        category = %category.name,
        records = output.records.len(),
        clicks = outcome.clicks,
        "Rendered session finished"
    );
    Ok(output)
}

/// Navigate, wait for a table, expand it fully and return the final document
/// with the URL it was served from
async fn drive(
    ctx: &AcquisitionContext,
    session: &mut dyn RenderSession,
    category: &Category,
) -> Result<(String, LoadOutcome, String), AcquisitionError> {
    session
        .navigate(&category.url)
        .await
        .map_err(|e| AcquisitionError::render(&e))?;

    let controller = IncrementalLoadController::new(ctx.load_more.clone())
        .with_locator(ctx.locator.clone());
    wait_for_table(&controller, session, ctx.session.table_wait).await;

    let outcome = controller.expand_fully(session).await;

    let html = session
        .current_html()
        .await
        .map_err(|e| AcquisitionError::render(&e))?;

    let page_url = match session.current_url().await {
        Ok(Some(url)) if !url.is_empty() && url != "about:blank" => url,
        Ok(_) => category.url.clone(),
        Err(e) => {
            debug!("Page URL unavailable, using entry URL: {e:#}");
            category.url.clone()
        }
    };
    Ok((html, outcome, page_url))
}

/// Poll until the rendered document holds a table with rows, or `limit` elapses
async fn wait_for_table(
    controller: &IncrementalLoadController,
    session: &mut dyn RenderSession,
    limit: Duration,
) {
    let deadline = Instant::now() + limit;
    loop {
        match session.current_html().await {
            Ok(html) if controller.count_rows(&html) > 0 => return,
            Ok(_) => {}
            Err(e) => debug!("Document not readable yet: {e}"),
        }
        if Instant::now() >= deadline {
            warn!("No table rendered within {}s, continuing anyway", limit.as_secs());
            return;
        }
        tokio::time::sleep(TABLE_POLL_INTERVAL).await;
    }
}
