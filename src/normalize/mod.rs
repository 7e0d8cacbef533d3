//! Best-effort conversion of raw cell text into typed scalars
//!
//! Upstream pages mix plain integers, French-formatted decimals ("1 234,56")
//! and free text in the same column. Normalization only changes the type when
//! the token converts cleanly; anything else is kept as the trimmed string.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::Scalar;

/// Digits with optional internal spaces, commas or periods.
///
/// Non-breaking and narrow non-breaking spaces count as spaces: they are the
/// thousands separator French locales actually emit.
static NUMERIC_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:[ \u{00A0}\u{202F},.]+\d+)*$")
        .expect("BUG: hardcoded numeric candidate regex is statically valid")
});

/// Normalize one raw cell string.
///
/// Returns the scalar and whether it was converted to a number. Never fails.
#[must_use]
pub fn normalize(raw: &str) -> (Scalar, bool) {
    let trimmed = raw.trim();
    match parse_localized_number(trimmed) {
        Some(number) => (number, true),
        None => (Scalar::Text(trimmed.to_string()), false),
    }
}

/// Parse a locale-formatted number, or `None` if the token is not one.
///
/// Internal spaces are thousands separators and are dropped, then a comma is
/// read as the decimal point. A remaining point makes the value a float.
#[must_use]
pub fn parse_localized_number(token: &str) -> Option<Scalar> {
    if !NUMERIC_CANDIDATE.is_match(token) {
        return None;
    }

    let compact: String = token
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00A0}' | '\u{202F}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if compact.contains('.') {
        compact
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Scalar::Float)
    } else {
        compact.parse::<i64>().ok().map(Scalar::Integer)
    }
}
