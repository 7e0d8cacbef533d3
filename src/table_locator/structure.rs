//! Structural queries over table-like markup
//!
//! A "table" is either a real `<table>` or an ARIA grid (`role="grid"`,
//! `"treegrid"` or `"table"`). Rows and cells are resolved the same way for
//! both so the extractor never has to care which one it was handed.

use scraper::ElementRef;

const TABLE_ROLES: &[&str] = &["grid", "treegrid", "table"];
const CELL_ROLES: &[&str] = &["gridcell", "cell", "columnheader", "rowheader"];

fn role(element: &ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("role")
        .map(|r| r.trim().to_ascii_lowercase())
}

#[must_use]
pub fn is_table_like(element: &ElementRef<'_>) -> bool {
    element.value().name() == "table" || role(element).is_some_and(|r| TABLE_ROLES.contains(&r.as_str()))
}

#[must_use]
pub fn is_row(element: &ElementRef<'_>) -> bool {
    element.value().name() == "tr" || role(element).as_deref() == Some("row")
}

#[must_use]
pub fn is_cell(element: &ElementRef<'_>) -> bool {
    matches!(element.value().name(), "td" | "th")
        || role(element).is_some_and(|r| CELL_ROLES.contains(&r.as_str()))
}

/// Whether `element` sits inside a `<thead>`/`<tfoot>` (or ARIA header rowgroup)
/// before reaching `table`
#[must_use]
pub fn in_header_or_footer(element: &ElementRef<'_>, table: &ElementRef<'_>) -> bool {
    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        if ancestor.id() == table.id() {
            return false;
        }
        if matches!(ancestor.value().name(), "thead" | "tfoot") {
            return true;
        }
    }
    false
}

/// Rows that belong to `table` itself, in document order.
///
/// Rows of nested tables are excluded: a row belongs to the nearest
/// table-like ancestor only.
#[must_use]
pub fn own_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| is_row(el))
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(is_table_like)
                .is_some_and(|owner| owner.id() == table.id())
        })
        .collect()
}

/// Cells directly under a row, in column order
#[must_use]
pub fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(is_cell)
        .collect()
}

/// Visible text of an element with whitespace runs collapsed
#[must_use]
pub fn visible_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
