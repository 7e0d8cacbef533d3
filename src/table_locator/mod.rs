//! Locate the data-bearing table inside an arbitrary markup tree
//!
//! Identifiers and classes on ranking pages drift between releases, so the
//! locator tries an ordered list of strategies, most specific first:
//! 1. Known historical markers (container ids, class fragments)
//! 2. Explicit grid/table ARIA role
//! 3. Generic table-like class fragments
//! 4. The table with the most rows (first one wins ties)
//! 5. The first table in document order
//!
//! The first strategy that matches wins; lower ones are never evaluated.

pub mod structure;

use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

pub use structure::{is_cell, is_row, is_table_like, own_rows, row_cells, visible_text};

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table").expect("BUG: hardcoded selector 'table' is statically valid")
});

static ROLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[role]").expect("BUG: hardcoded selector '[role]' is statically valid")
});

static ANY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("*").expect("BUG: hardcoded selector '*' is statically valid")
});

/// Which strategy matched the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorStrategy {
    KnownMarker,
    StructuralRole,
    ClassFragment,
    LargestByRows,
    FirstTable,
}

impl LocatorStrategy {
    /// Fixed priority order
    pub const ORDER: [Self; 5] = [
        Self::KnownMarker,
        Self::StructuralRole,
        Self::ClassFragment,
        Self::LargestByRows,
        Self::FirstTable,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::KnownMarker => "known_marker",
            Self::StructuralRole => "structural_role",
            Self::ClassFragment => "class_fragment",
            Self::LargestByRows => "largest_by_rows",
            Self::FirstTable => "first_table",
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A located table: a view into the parsed document, never outliving it
#[derive(Debug, Clone, Copy)]
pub struct TableNode<'a> {
    pub element: ElementRef<'a>,
    pub strategy: LocatorStrategy,
}

impl<'a> TableNode<'a> {
    /// Number of rows owned by this table (nested tables excluded)
    #[must_use]
    pub fn row_count(&self) -> usize {
        own_rows(&self.element).len()
    }
}

/// Marker lists driving the locator strategies
#[derive(Debug, Clone)]
pub struct TableLocator {
    /// Exact container ids known to wrap the ranking table
    pub marker_ids: Vec<String>,
    /// Class fragments known to sit on the ranking table itself
    pub marker_table_classes: Vec<String>,
    /// Fragments of container ids/classes known to wrap the ranking table
    pub marker_container_fragments: Vec<String>,
    /// Generic table-like class fragments, in priority order
    pub generic_class_fragments: Vec<String>,
}

impl Default for TableLocator {
    fn default() -> Self {
        Self {
            marker_ids: vec!["table.classement".into()],
            marker_table_classes: vec!["tablesorter".into()],
            marker_container_fragments: vec!["table classement".into(), "classement".into()],
            generic_class_fragments: vec![
                "tablesorter".into(),
                "data-table".into(),
                "c-table".into(),
                "table".into(),
            ],
        }
    }
}

impl TableLocator {
    /// Find the most likely data table, or `None` when nothing table-like exists
    #[must_use]
    pub fn locate<'a>(&self, document: &'a Html) -> Option<TableNode<'a>> {
        for strategy in LocatorStrategy::ORDER {
            if let Some(element) = self.apply(strategy, document) {
                info!(strategy = %strategy, "Table located");
                return Some(TableNode { element, strategy });
            }
            debug!(strategy = %strategy, "Locator strategy did not match");
        }
        None
    }

    /// Run a single strategy in isolation
    #[must_use]
    pub fn apply<'a>(&self, strategy: LocatorStrategy, document: &'a Html) -> Option<ElementRef<'a>> {
        match strategy {
            LocatorStrategy::KnownMarker => self.by_known_marker(document),
            LocatorStrategy::StructuralRole => by_structural_role(document),
            LocatorStrategy::ClassFragment => self.by_class_fragment(document),
            LocatorStrategy::LargestByRows => largest_by_rows(document),
            LocatorStrategy::FirstTable => document.select(&TABLE_SELECTOR).next(),
        }
    }

    fn by_known_marker<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        for id in &self.marker_ids {
            let found = document
                .select(&ANY_SELECTOR)
                .find(|el| el.value().id() == Some(id.as_str()))
                .and_then(|container| table_in(&container));
            if found.is_some() {
                return found;
            }
        }

        for fragment in &self.marker_table_classes {
            let found = document
                .select(&TABLE_SELECTOR)
                .find(|table| attr_contains(table, "class", fragment));
            if found.is_some() {
                return found;
            }
        }

        for fragment in &self.marker_container_fragments {
            let found = document
                .select(&ANY_SELECTOR)
                .filter(|el| el.value().name() != "table")
                .filter(|el| attr_contains(el, "id", fragment) || attr_contains(el, "class", fragment))
                .find_map(|container| table_in(&container));
            if found.is_some() {
                return found;
            }
        }

        None
    }

    fn by_class_fragment<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        self.generic_class_fragments.iter().find_map(|fragment| {
            document
                .select(&TABLE_SELECTOR)
                .find(|table| attr_contains(table, "class", fragment))
        })
    }
}

/// Element with an explicit grid/table role. A role container wrapping a real
/// `<table>` resolves to that table.
fn by_structural_role(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&ROLE_SELECTOR)
        .filter(is_role_table)
        .find_map(|el| {
            if el.value().name() == "table" {
                Some(el)
            } else if let Some(inner) = el.select(&TABLE_SELECTOR).next() {
                Some(inner)
            } else {
                // Pure ARIA grid: only useful if it actually carries rows
                (!own_rows(&el).is_empty()).then_some(el)
            }
        })
}

fn is_role_table(el: &ElementRef<'_>) -> bool {
    el.value().attr("role").is_some_and(|role| {
        matches!(
            role.trim().to_ascii_lowercase().as_str(),
            "grid" | "treegrid" | "table"
        )
    })
}

/// Table with the most rows; strictly greater wins so ties keep the first.
/// Tables without any row are left to the first-table fallback.
fn largest_by_rows(document: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(ElementRef<'_>, usize)> = None;
    for table in document.select(&TABLE_SELECTOR) {
        let rows = own_rows(&table).len();
        if rows > 0 && best.is_none_or(|(_, max)| rows > max) {
            best = Some((table, rows));
        }
    }
    best.map(|(table, _)| table)
}

/// The element itself if it is a table, else its first descendant table
fn table_in<'a>(container: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    if container.value().name() == "table" {
        Some(*container)
    } else {
        container.select(&TABLE_SELECTOR).next()
    }
}

fn attr_contains(el: &ElementRef<'_>, attr: &str, fragment: &str) -> bool {
    el.value()
        .attr(attr)
        .is_some_and(|value| value.to_lowercase().contains(&fragment.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(html: &str) -> Option<(LocatorStrategy, String)> {
        let doc = Html::parse_document(html);
        TableLocator::default()
            .locate(&doc)
            .map(|node| (node.strategy, node.element.value().attr("id").unwrap_or("").to_string()))
    }

    #[test]
    fn known_container_id_wins_over_everything() {
        let html = r#"
            <table id="big" role="grid"><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></table>
            <div id="table.classement"><table id="target"><tr><td>x</td></tr></table></div>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::KnownMarker, "target".into()))
        );
    }

    #[test]
    fn classement_container_fragment_is_a_known_marker() {
        let html = r#"
            <table id="layout"><tr><td>nav</td></tr></table>
            <div class="bloc-Classement-general"><table id="target"><tr><td>x</td></tr></table></div>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::KnownMarker, "target".into()))
        );
    }

    #[test]
    fn role_grid_beats_generic_classes() {
        let html = r#"
            <table id="styled" class="data-table"><tr><td>a</td></tr></table>
            <table id="grid" role="grid"><tr><td>b</td></tr></table>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::StructuralRole, "grid".into()))
        );
    }

    #[test]
    fn aria_grid_without_table_is_located() {
        let html = r#"
            <div id="g" role="grid">
              <div role="row"><span role="columnheader">Nom</span><span role="columnheader">Gains</span></div>
              <div role="row"><span role="gridcell">A</span><span role="gridcell">1</span></div>
            </div>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::StructuralRole, "g".into()))
        );
    }

    #[test]
    fn generic_class_fragment_matches_in_priority_order() {
        let html = r#"
            <table id="plain-table" class="my-table"><tr><td>a</td></tr></table>
            <table id="dt" class="js-data-table"><tr><td>b</td></tr></table>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::ClassFragment, "dt".into()))
        );
    }

    #[test]
    fn largest_table_wins_and_ties_keep_the_first() {
        let html = r#"
            <table id="small"><tr><td>a</td></tr></table>
            <table id="first-big"><tr><td>a</td></tr><tr><td>b</td></tr></table>
            <table id="second-big"><tr><td>a</td></tr><tr><td>b</td></tr></table>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::LargestByRows, "first-big".into()))
        );
    }

    #[test]
    fn nested_rows_are_not_counted_for_the_outer_table() {
        let html = r#"
            <table id="outer"><tr><td>
                <table id="inner"><tr><td>1</td></tr><tr><td>2</td></tr><tr><td>3</td></tr></table>
            </td></tr></table>"#;
        assert_eq!(
            locate(html),
            Some((LocatorStrategy::LargestByRows, "inner".into()))
        );
    }

    #[test]
    fn empty_table_falls_back_to_first_table() {
        assert_eq!(
            locate(r#"<p>x</p><table id="empty"></table>"#),
            Some((LocatorStrategy::FirstTable, "empty".into()))
        );
    }

    #[test]
    fn no_table_is_not_found() {
        assert_eq!(locate("<html><body><p>nothing here</p></body></html>"), None);
    }
}
