//! Per-cell value and link resolution

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::table_locator::visible_text;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded selector 'a[href]' is statically valid")
});

/// Header attributes, highest priority first
pub const HEADER_ATTRIBUTES: &[&str] = &["data-label", "data-col", "aria-label"];

/// Cell value attributes, highest priority first
pub const VALUE_ATTRIBUTES: &[&str] = &["data-text", "data-title", "data-value"];

fn first_attribute(cell: &ElementRef<'_>, attributes: &[&str]) -> Option<String> {
    attributes.iter().find_map(|attr| {
        cell.value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

/// Raw header name: labelling attributes, then visible text. Empty when none
/// resolves, leaving placeholder generation to `HeaderSet`.
#[must_use]
pub fn header_name(cell: &ElementRef<'_>) -> String {
    first_attribute(cell, HEADER_ATTRIBUTES).unwrap_or_else(|| visible_text(cell))
}

/// Raw cell value: value attributes, then visible text
#[must_use]
pub fn cell_value(cell: &ElementRef<'_>) -> String {
    first_attribute(cell, VALUE_ATTRIBUTES).unwrap_or_else(|| visible_text(cell))
}

/// First usable hyperlink in the cell, resolved against `base` when possible
#[must_use]
pub fn cell_link(cell: &ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let href = cell
        .select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| {
            !href.is_empty()
                && *href != "#"
                && !href.to_ascii_lowercase().starts_with("javascript:")
        })?;

    match base.map(|base| base.join(href)) {
        Some(Ok(resolved)) => Some(resolved.to_string()),
        _ => Some(href.to_string()),
    }
}
