//! Turn a located table into a header set and normalized records
//!
//! Alignment is strictly positional: cell `i` of a data row maps to header
//! `i`. Trailing cells beyond the header count are ignored, short rows keep
//! whatever cells they have.

pub mod cell;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::model::{HeaderSet, Record, link_key};
use crate::normalize::normalize;
use crate::table_locator::structure::in_header_or_footer;
use crate::table_locator::{TableNode, own_rows, row_cells};

pub use cell::{cell_link, cell_value, header_name};

static BASE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("base[href]").expect("BUG: hardcoded selector 'base[href]' is statically valid")
});

/// Rows with fewer cells than this are layout noise, not data
pub const MIN_CELLS_PER_ROW: usize = 2;

/// Headers and records pulled out of one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableExtraction {
    pub headers: HeaderSet,
    pub records: Vec<Record>,
}

/// Base URL for link resolution: `<base href>` when present, else the page URL
#[must_use]
pub fn document_base(document: &Html, page_url: &str) -> Option<Url> {
    let page = Url::parse(page_url).ok();
    let declared = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|base| base.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty());

    match (declared, page) {
        (Some(href), Some(page)) => page.join(href).ok().or(Some(page)),
        (Some(href), None) => Url::parse(href).ok(),
        (None, page) => page,
    }
}

/// Origin that relative cell links resolve against: scheme and host of the
/// document base, path dropped
#[must_use]
pub fn link_base(document: &Html, page_url: &str) -> Option<Url> {
    let mut base = document_base(document, page_url)?;
    base.set_query(None);
    base.set_fragment(None);
    base.set_path("/");
    Some(base)
}

/// Extract the header set and every data record of `node`
#[must_use]
pub fn extract(node: &TableNode<'_>, base: Option<&Url>) -> TableExtraction {
    let table = node.element;
    let rows = own_rows(&table);

    let header_row = rows
        .iter()
        .find(|row| is_in_thead(row, &table))
        .or_else(|| rows.first())
        .copied();

    let data_rows: Vec<ElementRef<'_>> = rows
        .iter()
        .filter(|row| Some(row.id()) != header_row.map(|h| h.id()))
        .filter(|row| !in_header_or_footer(row, &table))
        .copied()
        .collect();

    let header_cells = header_row.map(|row| row_cells(&row)).unwrap_or_default();
    let headers = if header_cells.is_empty() {
        let widest = data_rows.iter().map(|row| row_cells(row).len()).max().unwrap_or(0);
        HeaderSet::placeholders(widest)
    } else {
        HeaderSet::from_raw(header_cells.iter().map(header_name))
    };

    let mut records = Vec::with_capacity(data_rows.len());
    let mut skipped = 0usize;
    for row in &data_rows {
        match extract_row(row, &headers, base) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    debug!(
        headers = headers.len(),
        records = records.len(),
        skipped,
        "Extracted table rows"
    );

    TableExtraction { headers, records }
}

/// One record from one row, or `None` when the row is too short or carries
/// no non-link value
fn extract_row(row: &ElementRef<'_>, headers: &HeaderSet, base: Option<&Url>) -> Option<Record> {
    let cells = row_cells(row);
    if cells.len() < MIN_CELLS_PER_ROW {
        return None;
    }

    let mut record = Record::new();
    let mut has_value = false;
    for (index, cell) in cells.iter().enumerate() {
        let Some(header) = headers.get(index) else {
            break;
        };

        let raw = cell_value(cell);
        if !raw.is_empty() {
            let (scalar, _) = normalize(&raw);
            record.insert(header.to_string(), Value::from(scalar));
            has_value = true;
        }
        if let Some(link) = cell_link(cell, base) {
            record.insert(link_key(header), Value::String(link));
        }
    }

    has_value.then_some(record)
}

fn is_in_thead(row: &ElementRef<'_>, table: &ElementRef<'_>) -> bool {
    for ancestor in row.ancestors().filter_map(ElementRef::wrap) {
        if ancestor.id() == table.id() {
            return false;
        }
        if ancestor.value().name() == "thead" {
            return true;
        }
    }
    false
}
