//! Embedded Payload strategy: JSON data shipped inside inline scripts
//!
//! Client-rendered rankings often carry their rows as a JSON literal in the
//! page itself, either bare (`[{"nom": ...}]`) or assigned to a variable.
//! Candidate positions are found with regexes, then a balanced-bracket scan
//! cuts out one complete value to hand to the JSON parser.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::error::AcquisitionError;
use super::{AcquisitionContext, StrategyOutput};
use crate::model::{Category, ExtractionMetadata, Record, placeholder_header};
use crate::normalize::normalize;
use crate::utils::constants::PAYLOAD_NAME_HINTS;

static INLINE_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script:not([src])")
        .expect("BUG: hardcoded selector 'script:not([src])' is statically valid")
});

/// Start of an array of objects: `[ { "key":`
static JSON_ARRAY_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*\{\s*"[^"]+"\s*:"#)
        .expect("BUG: hardcoded JSON array regex is statically valid")
});

/// `var name = [` / `const name = {` / `window.name = [`
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:var|let|const)\s+|\bwindow\.)([A-Za-z_$][\w$]*)\s*=\s*([\[{])")
        .expect("BUG: hardcoded assignment regex is statically valid")
});

/// A JSON list found in a script
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadMatch {
    /// Assigned variable name, `None` for a bare literal
    pub variable: Option<String>,
    pub items: Vec<Value>,
}

/// End offset (exclusive) of the bracketed value opening at `start`.
///
/// Tracks nesting with a stack so `[{]}` is rejected, and ignores brackets
/// inside single- or double-quoted strings. Escapes only apply in strings.
#[must_use]
pub fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.get(start), Some(b'[' | b'{')) {
        return None;
    }

    let mut stack: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == q {
                quote = None;
            }
            continue;
        }

        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            b']' | b'}' => {
                if stack.pop() != Some(byte) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_at(text: &str, start: usize) -> Option<Value> {
    let end = balanced_end(text, start)?;
    match serde_json::from_str(&text[start..end]) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Candidate at offset {start} is not JSON: {e}");
            None
        }
    }
}

fn non_empty_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(items),
        _ => None,
    }
}

/// List carried by an assignment: the value itself or its `data` member
fn assigned_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(_) => non_empty_list(value),
        Value::Object(mut object) => object.remove("data").and_then(non_empty_list),
        _ => None,
    }
}

fn name_hints_data(name: &str, category: &str) -> bool {
    let lowered = name.to_lowercase();
    let category = category.to_lowercase();
    PAYLOAD_NAME_HINTS.iter().any(|hint| lowered.contains(hint))
        || (!category.is_empty() && lowered.contains(&category))
}

/// First usable payload in `scripts`, in document order.
///
/// Within a script, bare arrays of objects are tried before variable
/// assignments.
#[must_use]
pub fn find_payload<S: AsRef<str>>(scripts: &[S], category: &str) -> Option<PayloadMatch> {
    for script in scripts {
        let script = script.as_ref();

        for found in JSON_ARRAY_START.find_iter(script) {
            if let Some(items) = parse_at(script, found.start()).and_then(non_empty_list) {
                return Some(PayloadMatch {
                    variable: None,
                    items,
                });
            }
        }

        for captures in ASSIGNMENT.captures_iter(script) {
            let (Some(name), Some(bracket)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            if !name_hints_data(name.as_str(), category) {
                continue;
            }
            if let Some(items) = parse_at(script, bracket.start()).and_then(assigned_list) {
                return Some(PayloadMatch {
                    variable: Some(name.as_str().to_string()),
                    items,
                });
            }
        }
    }
    None
}

fn normalized_value(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::from(normalize(trimmed).0))
        }
        other => Some(other.clone()),
    }
}

/// Turn payload items into records.
///
/// Objects keep their keys, arrays become positional `Column_<n>` records,
/// scalars become `{"value": x}`. Items with nothing left are dropped.
#[must_use]
pub fn payload_records(items: &[Value]) -> Vec<Record> {
    items
        .iter()
        .filter_map(|item| {
            let mut record = Record::new();
            match item {
                Value::Object(object) => {
                    for (key, value) in object {
                        if let Some(value) = normalized_value(value) {
                            record.insert(key.clone(), value);
                        }
                    }
                }
                Value::Array(cells) => {
                    for (index, value) in cells.iter().enumerate() {
                        if let Some(value) = normalized_value(value) {
                            record.insert(placeholder_header(index), value);
                        }
                    }
                }
                scalar => {
                    if let Some(value) = normalized_value(scalar) {
                        record.insert("value".to_string(), value);
                    }
                }
            }
            (!record.is_empty()).then_some(record)
        })
        .collect()
}

/// Records from a whole JSON document: a list, or an object carrying a
/// `data` list
pub fn json_document_records(text: &str) -> Result<Vec<Record>, AcquisitionError> {
    let value: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| AcquisitionError::Decode(format!("invalid JSON document: {e}")))?;
    let items = assigned_list(value).ok_or_else(|| {
        AcquisitionError::Payload("JSON document holds no non-empty list".to_string())
    })?;
    Ok(payload_records(&items))
}

fn inline_scripts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&INLINE_SCRIPT)
        .map(|script| script.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect()
}

/// Fetch the entry page and pull records out of its inline scripts
pub async fn acquire(
    ctx: &AcquisitionContext,
    category: &Category,
) -> Result<StrategyOutput, AcquisitionError> {
    let document = ctx.fetch_entry(&category.url).await?;
    let scripts = inline_scripts(&document.text());

    let payload = find_payload(&scripts, &category.name).ok_or_else(|| {
        AcquisitionError::Payload(format!("{} inline scripts scanned", scripts.len()))
    })?;

    let records = payload_records(&payload.items);
    info!(
        category = %category.name,
        variable = payload.variable.as_deref().unwrap_or("<literal>"),
        items = payload.items.len(),
        records = records.len(),
        "Script payload found"
    );

    Ok(StrategyOutput {
        records,
        filters: serde_json::Map::new(),
        metadata: ExtractionMetadata {
            script_variable: payload.variable,
            ..ExtractionMetadata::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn balanced_scan_ignores_brackets_in_strings() {
        let text = r#"x = [{"a": "]}", "b": 'it\'s [x]'}, [1]]; tail"#;
        let start = text.find('[').expect("bracket");
        let end = balanced_end(text, start).expect("balanced");
        assert!(text[..end].ends_with("[1]]"));
    }

    #[test]
    fn mismatched_brackets_are_rejected() {
        assert_eq!(balanced_end("[{]}", 0), None);
        assert_eq!(balanced_end("[1, 2", 0), None);
        assert_eq!(balanced_end("x", 0), None);
    }

    #[test]
    fn bare_array_literal_is_found() {
        let scripts = [r#"init(); render([{"Nom": "Furioso", "Gains": "12 500"}]);"#];
        let found = find_payload(&scripts, "chevaux").expect("payload");
        assert_eq!(found.variable, None);
        assert_eq!(
            Value::Object(payload_records(&found.items)[0].clone()),
            json!({"Nom": "Furioso", "Gains": 12500})
        );
    }

    #[test]
    fn hinted_assignment_with_data_member() {
        let scripts = [
            "var config = [1, 2, 3];",
            r#"window.rankingState = {"data": [["A", "1,5"], ["B", null]], "page": 1};"#,
        ];
        let found = find_payload(&scripts, "jockeys").expect("payload");
        assert_eq!(found.variable.as_deref(), Some("rankingState"));
        let records = payload_records(&found.items);
        assert_eq!(
            Value::Object(records[0].clone()),
            json!({"Column_1": "A", "Column_2": 1.5})
        );
        assert_eq!(Value::Object(records[1].clone()), json!({"Column_1": "B"}));
    }

    #[test]
    fn category_name_counts_as_hint_and_scalars_get_value_key() {
        let scripts = ["const jockeysPage = [\"Alpha\", \"\", 3];"];
        let found = find_payload(&scripts, "Jockeys").expect("payload");
        let records = payload_records(&found.items);
        assert_eq!(records.len(), 2);
        assert_eq!(Value::Object(records[1].clone()), json!({"value": 3}));
    }

    #[test]
    fn unhinted_or_empty_payloads_are_skipped() {
        let scripts = [
            "var settings = [{\"k\": 1}];".to_string(),
            "var dataRows = [];".to_string(),
            "let tableau = {\"data\": []};".to_string(),
        ];
        // The bare-literal pass still sees the settings array
        let found = find_payload(&scripts[..1], "x").expect("bare literal");
        assert_eq!(found.variable, None);
        assert!(find_payload(&scripts[1..], "x").is_none());
    }
}
