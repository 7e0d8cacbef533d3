//! Capture the filters a ranking page was rendered with
//!
//! Rankings are usually scoped by year, discipline or region. Recording the
//! active selection alongside the records tells a reader which slice of the
//! ranking the data is.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::table_locator::visible_text;

static SELECT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("select").expect("BUG: hardcoded selector 'select' is statically valid")
});

static SELECTED_OPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("option[selected]")
        .expect("BUG: hardcoded selector 'option[selected]' is statically valid")
});

static CHECKED_INPUT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input[type=radio][checked], input[type=checkbox][checked]")
        .expect("BUG: hardcoded checked input selector is statically valid")
});

static ACTIVE_FILTER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".filter.active, .filter.selected, .tab.active, .btn.active")
        .expect("BUG: hardcoded active filter selector is statically valid")
});

static LABEL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("label[for]").expect("BUG: hardcoded selector 'label[for]' is statically valid")
});

/// Active filters of the page, in document order.
///
/// Later entries with the same key overwrite earlier ones.
#[must_use]
pub fn extract_filters(document: &Html) -> Map<String, Value> {
    let mut filters = Map::new();

    for select in document.select(&SELECT_SELECTOR) {
        let Some(key) = attr(&select, "name").or_else(|| label_for(document, &select)) else {
            continue;
        };
        if let Some(option) = select.select(&SELECTED_OPTION).next() {
            let text = visible_text(&option);
            let value = if text.is_empty() {
                attr(&option, "value").unwrap_or_default()
            } else {
                text
            };
            filters.insert(key, Value::String(value));
        }
    }

    for input in document.select(&CHECKED_INPUT) {
        let Some(key) = attr(&input, "name").or_else(|| attr(&input, "id")) else {
            continue;
        };
        let value = match attr(&input, "value").filter(|v| v != "on") {
            Some(value) => value,
            None => label_for(document, &input).unwrap_or_else(|| "enabled".to_string()),
        };
        filters.insert(key, Value::String(value));
    }

    for element in document.select(&ACTIVE_FILTER) {
        let key = attr(&element, "data-filter")
            .or_else(|| attr(&element, "data-type"))
            .unwrap_or_else(|| "filter".to_string());
        let text = visible_text(&element);
        if !text.is_empty() {
            filters.insert(key, Value::String(text));
        }
    }

    filters
}

fn attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Text of the `<label for=...>` pointing at `element`
fn label_for(document: &Html, element: &ElementRef<'_>) -> Option<String> {
    let id = element.value().id()?;
    document
        .select(&LABEL_SELECTOR)
        .find(|label| label.value().attr("for") == Some(id))
        .map(|label| visible_text(&label))
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_selects_inputs_and_active_tabs() {
        let doc = Html::parse_document(
            r#"<form>
                 <select name="annee"><option>2023</option><option selected>2024</option></select>
                 <label for="disc">Discipline</label>
                 <select id="disc"><option selected value="p">Plat</option></select>
                 <select><option selected>orphan</option></select>
                 <input type="radio" name="sexe" value="F" checked>
                 <label for="pro">Professionnels</label>
                 <input type="checkbox" id="pro" checked>
               </form>
               <ul><li class="tab active" data-type="periode">Année</li></ul>"#,
        );
        let filters = extract_filters(&doc);
        assert_eq!(filters.get("annee"), Some(&Value::from("2024")));
        assert_eq!(filters.get("Discipline"), Some(&Value::from("Plat")));
        assert_eq!(filters.get("sexe"), Some(&Value::from("F")));
        assert_eq!(filters.get("pro"), Some(&Value::from("Professionnels")));
        assert_eq!(filters.get("periode"), Some(&Value::from("Année")));
        assert_eq!(filters.len(), 5);
    }

    #[test]
    fn page_without_filters_is_empty() {
        let doc = Html::parse_document("<p>rien</p>");
        assert!(extract_filters(&doc).is_empty());
    }
}
