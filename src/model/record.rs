//! Records, scalars and header sets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Suffix appended to a header name for the hyperlink captured in that column
pub const LINK_SUFFIX: &str = "_url";

/// One normalized output row.
///
/// Backed by an insertion-ordered JSON map so keys follow column order and
/// integers stay distinct from floats and strings when serialized.
pub type Record = serde_json::Map<String, Value>;

/// A normalized cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Integer(n) => Value::from(n),
            // Non-finite floats never reach here; the normalizer keeps them as text
            Scalar::Float(f) => serde_json::Number::from_f64(f)
                .map_or_else(|| Value::String(f.to_string()), Value::Number),
            Scalar::Text(s) => Value::String(s),
        }
    }
}

/// Key under which the hyperlink of `header` is stored
#[must_use]
pub fn link_key(header: &str) -> String {
    format!("{header}{LINK_SUFFIX}")
}

/// Positional placeholder for column `index` (0-based), e.g. `Column_3` for index 2
#[must_use]
pub fn placeholder_header(index: usize) -> String {
    format!("Column_{}", index + 1)
}

/// Ordered column names, positionally aligned to cell indices.
///
/// Empty and repeated names are replaced by positional placeholders so every
/// column resolves to a distinct key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
    /// Build a header set from raw candidate names
    #[must_use]
    pub fn from_raw<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let headers = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let name = name.as_ref().trim();
                if name.is_empty() || !seen.insert(name.to_string()) {
                    let mut placeholder = placeholder_header(index);
                    let mut suffix = 2;
                    while seen.contains(&placeholder) {
                        placeholder = format!("{}_{suffix}", placeholder_header(index));
                        suffix += 1;
                    }
                    seen.insert(placeholder.clone());
                    placeholder
                } else {
                    name.to_string()
                }
            })
            .collect();
        Self(headers)
    }

    /// `count` positional placeholders
    #[must_use]
    pub fn placeholders(count: usize) -> Self {
        Self((0..count).map(placeholder_header).collect())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_and_empty_headers_get_placeholders() {
        let headers = HeaderSet::from_raw(["Rang", "", "Nom", "Nom", " Gains "]);
        assert_eq!(
            headers.into_vec(),
            vec!["Rang", "Column_2", "Nom", "Column_4", "Gains"]
        );
    }

    #[test]
    fn placeholders_never_collide_with_real_headers() {
        let headers = HeaderSet::from_raw(["Column_2", "", "Column_2"]).into_vec();
        assert_eq!(headers, vec!["Column_2", "Column_2_2", "Column_3"]);

        let unique: HashSet<_> = headers.iter().collect();
        assert_eq!(unique.len(), headers.len());
    }

    #[test]
    fn scalars_serialize_with_their_type() {
        assert_eq!(Value::from(Scalar::Integer(12_500)), serde_json::json!(12_500));
        assert_eq!(Value::from(Scalar::Float(1234.56)), serde_json::json!(1234.56));
        assert_eq!(
            Value::from(Scalar::Text("N/A".into())),
            serde_json::json!("N/A")
        );
    }
}
