//! File Download strategy: find an export link, fetch it, parse it as
//! delimited text (or as JSON when the export is a JSON document)
//!
//! Link discovery runs three probes, most explicit first:
//! 1. anchors whose href or text mentions an export keyword
//! 2. elements tagged with export attributes or classes
//! 3. file URLs spelled out in inline scripts

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::delimited::parse_bytes;
use super::embedded_payload::json_document_records;
use super::error::AcquisitionError;
use super::{AcquisitionContext, StrategyOutput};
use crate::fetch::FetchRequest;
use crate::model::{Category, ContentKind, ExtractionMetadata, RawDocument};
use crate::row_extractor::document_base;
use crate::table_locator::visible_text;
use crate::utils::constants::{DOWNLOAD_CLASS_FRAGMENTS, DOWNLOAD_KEYWORDS, DOWNLOAD_URL_ATTRIBUTES};
use crate::utils::{origin, resolve_url};

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded selector 'a[href]' is statically valid")
});

static ACTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a, button, input").expect("BUG: hardcoded action selector is statically valid")
});

static ANY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("*").expect("BUG: hardcoded selector '*' is statically valid")
});

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script").expect("BUG: hardcoded selector 'script' is statically valid")
});

/// One quoted-URL pattern per keyword, e.g. `"…/export.csv?x=1"`
static SCRIPT_URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DOWNLOAD_KEYWORDS
        .iter()
        .map(|keyword| {
            RegexBuilder::new(&format!(
                r#"["']((?:https?://)?[^"'\s]+\.{}[^"']*)["']"#,
                regex::escape(keyword)
            ))
            .case_insensitive(true)
            .build()
            .expect("BUG: script URL pattern built from escaped keyword is statically valid")
        })
        .collect()
});

fn mentions_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    DOWNLOAD_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Download target carried by an element: a URL attribute, else `href`
fn target_of(element: &ElementRef<'_>) -> Option<String> {
    DOWNLOAD_URL_ATTRIBUTES
        .iter()
        .chain(std::iter::once(&"href"))
        .find_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .filter(|target| !target.is_empty())
        .map(str::to_string)
}

fn probe_anchors(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter(|a| {
            a.value().attr("href").is_some_and(mentions_keyword) || mentions_keyword(&visible_text(a))
        })
        .filter_map(|a| a.value().attr("href").map(str::to_string))
        .collect()
}

fn probe_attributes(document: &Html) -> Vec<String> {
    let mut targets = Vec::new();

    // data-* attribute names such as data-export or data-csv
    for element in document.select(&ANY_SELECTOR) {
        let tagged = element
            .value()
            .attrs()
            .any(|(name, _)| name.starts_with("data-") && mentions_keyword(&name[5..]));
        if tagged && let Some(target) = target_of(&element) {
            targets.push(target);
        }
    }

    for element in document.select(&ACTION_SELECTOR) {
        let class = element.value().attr("class").unwrap_or_default().to_lowercase();
        if DOWNLOAD_CLASS_FRAGMENTS.iter().any(|f| class.contains(f))
            && let Some(target) = target_of(&element)
        {
            targets.push(target);
        }
    }

    for element in document.select(&ANY_SELECTOR) {
        for attr in DOWNLOAD_URL_ATTRIBUTES {
            if let Some(value) = element.value().attr(attr)
                && mentions_keyword(value)
            {
                targets.push(value.trim().to_string());
            }
        }
    }

    targets
}

fn probe_scripts(document: &Html) -> Vec<String> {
    let mut targets = Vec::new();
    for script in document.select(&SCRIPT_SELECTOR) {
        let body = script.text().collect::<String>();
        for pattern in SCRIPT_URL_PATTERNS.iter() {
            targets.extend(
                pattern
                    .captures_iter(&body)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str().to_string()),
            );
        }
    }
    targets
}

/// Candidate download URLs in probe order, resolved and deduplicated.
///
/// The page's own URL is never a candidate.
#[must_use]
pub fn find_download_links(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url)
        .map_or_else(|| page_url.to_string(), |url| url.to_string());

    let probes: [(&str, fn(&Html) -> Vec<String>); 3] = [
        ("anchors", probe_anchors),
        ("attributes", probe_attributes),
        ("scripts", probe_scripts),
    ];

    let mut links: Vec<String> = Vec::new();
    for (name, probe) in probes {
        let found = probe(&document);
        debug!(probe = name, candidates = found.len(), "Download link probe");
        for raw in found {
            if let Some(url) = resolve_url(&base, &raw)
                && url != page_url
                && !links.contains(&url)
            {
                links.push(url);
            }
        }
    }
    links
}

fn delimited_output(download: &RawDocument) -> Result<StrategyOutput, AcquisitionError> {
    let declared = download.charset.as_ref().map(|_| download.encoding());
    let table = parse_bytes(&download.bytes, declared)?;
    debug!(
        encoding = table.encoding,
        delimiter = %table.delimiter.escape_default(),
        "Delimited file decoded"
    );
    Ok(StrategyOutput {
        records: table.records,
        filters: serde_json::Map::new(),
        metadata: ExtractionMetadata {
            headers: table.headers.into_vec(),
            encoding: Some(table.encoding.to_string()),
            delimiter: Some(table.delimiter.to_string()),
            ..ExtractionMetadata::default()
        },
    })
}

fn json_output(download: &RawDocument) -> Result<StrategyOutput, AcquisitionError> {
    let records = json_document_records(&download.text())?;
    Ok(StrategyOutput {
        records,
        filters: serde_json::Map::new(),
        metadata: ExtractionMetadata {
            encoding: Some(download.encoding().name().to_string()),
            ..ExtractionMetadata::default()
        },
    })
}

pub async fn acquire(
    ctx: &AcquisitionContext,
    category: &Category,
) -> Result<StrategyOutput, AcquisitionError> {
    let page = ctx.fetch_entry(&category.url).await?;
    let links = find_download_links(&page.text(), &page.url);
    if links.is_empty() {
        return Err(AcquisitionError::NoDownloadLink(page.url.clone()));
    }
    info!(category = %category.name, candidates = links.len(), "Download links found");

    let referer = origin(&page.url);
    let mut last_error = AcquisitionError::NoDownloadLink(page.url.clone());

    for link in links {
        let request = FetchRequest::new(link.clone(), ctx.request_timeout)
            .with_headers(ctx.headers(referer.as_deref()));
        let download = match ctx.fetch(&request).await {
            Ok(download) => download,
            Err(e) => {
                warn!(url = %link, "Download failed: {e}");
                last_error = e;
                continue;
            }
        };

        let (parsed, suffix) = match download.kind {
            ContentKind::Markup => {
                debug!(url = %link, "Download target is a page, skipping");
                last_error = AcquisitionError::MarkupDownload(link);
                continue;
            }
            ContentKind::ScriptPayload => (json_output(&download), "_download.json"),
            ContentKind::DelimitedText => (delimited_output(&download), "_download.csv"),
        };
        let mut output = match parsed {
            Ok(output) => output,
            Err(e) => {
                warn!(url = %link, "Download did not parse: {e}");
                last_error = e;
                continue;
            }
        };
        ctx.sink.record(&category.name, suffix, &download.bytes).await;

        if output.records.is_empty() {
            debug!(url = %link, "Download parsed to zero records");
            continue;
        }

        info!(
            category = %category.name,
            url = %link,
            records = output.records.len(),
            "Download parsed"
        );
        output.metadata.download_url = Some(link);
        return Ok(output);
    }

    Err(last_error)
}
