//! Static Parse strategy: fetch the entry page, locate the table, extract

use scraper::Html;
use tracing::{info, warn};

use super::error::AcquisitionError;
use super::{AcquisitionContext, StrategyOutput};
use crate::model::{Category, ExtractionMetadata};
use crate::page_filters::extract_filters;
use crate::row_extractor::{extract, link_base};
use crate::table_locator::TableLocator;

/// Table extraction over one markup document, `None` when no table exists
#[must_use]
pub fn extract_from_markup(
    locator: &TableLocator,
    html: &str,
    page_url: &str,
) -> Option<StrategyOutput> {
    let document = Html::parse_document(html);
    let node = locator.locate(&document)?;
    let base = link_base(&document, page_url);
    let table = extract(&node, base.as_ref());

    Some(StrategyOutput {
        records: table.records,
        filters: extract_filters(&document),
        metadata: ExtractionMetadata {
            headers: table.headers.into_vec(),
            locator_strategy: Some(node.strategy.to_string()),
            ..ExtractionMetadata::default()
        },
    })
}

/// Locate and extract from `html`, snapshotting the document when no table exists
pub(crate) async fn extract_or_snapshot(
    ctx: &AcquisitionContext,
    category: &Category,
    html: &str,
    page_url: &str,
) -> Result<StrategyOutput, AcquisitionError> {
    match extract_from_markup(&ctx.locator, html, page_url) {
        Some(output) => Ok(output),
        None => {
            warn!(category = %category.name, "No table found in document");
            ctx.sink
                .record(&category.name, "_notfound.html", html.as_bytes())
                .await;
            Err(AcquisitionError::TableNotFound(page_url.to_string()))
        }
    }
}

pub async fn acquire(
    ctx: &AcquisitionContext,
    category: &Category,
) -> Result<StrategyOutput, AcquisitionError> {
    let document = ctx.fetch_entry(&category.url).await?;
    ctx.sink
        .record(&category.name, "_page.html", &document.bytes)
        .await;

    let html = document.text().into_owned();
    let output = extract_or_snapshot(ctx, category, &html, &document.url).await?;
    info!(
        category = %category.name,
        records = output.records.len(),
        "Static parse finished"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn markup_extraction_carries_headers_filters_and_strategy() {
        let html = r#"<select name="annee"><option selected>2024</option></select>
            <div id="table.classement"><table>
              <thead><tr><th>Nom</th><th>Gains</th></tr></thead>
              <tbody><tr><td>A</td><td>1 000</td></tr></tbody>
            </table></div>"#;
        let output = extract_from_markup(&TableLocator::default(), html, "https://example.org/")
            .expect("table");
        assert_eq!(output.metadata.headers, vec!["Nom", "Gains"]);
        assert_eq!(output.metadata.locator_strategy.as_deref(), Some("known_marker"));
        assert_eq!(output.filters.get("annee"), Some(&json!("2024")));
        assert_eq!(output.records[0].get("Gains"), Some(&json!(1000)));
    }

    #[test]
    fn no_table_yields_none() {
        assert!(
            extract_from_markup(&TableLocator::default(), "<p>vide</p>", "https://example.org/")
                .is_none()
        );
    }
}
