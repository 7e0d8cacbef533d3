//! Raw payloads produced by an acquisition attempt

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

/// What kind of content a fetched payload holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Markup,
    DelimitedText,
    ScriptPayload,
}

impl ContentKind {
    /// Classify a payload from its declared content type, falling back to a
    /// look at the first non-blank bytes.
    #[must_use]
    pub fn sniff(content_type: Option<&str>, body: &[u8]) -> Self {
        if let Some(ct) = content_type.map(str::to_ascii_lowercase) {
            if ct.contains("html") || ct.contains("xml") {
                return Self::Markup;
            }
            if ct.contains("csv") || ct.contains("tab-separated") || ct.contains("text/plain") {
                return Self::DelimitedText;
            }
            if ct.contains("json") || ct.contains("javascript") {
                return Self::ScriptPayload;
            }
        }

        let start = body
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(body.len());
        match body.get(start) {
            Some(b'<') => Self::Markup,
            Some(b'[' | b'{') => Self::ScriptPayload,
            _ => Self::DelimitedText,
        }
    }
}

/// Opaque payload plus its declared charset and content kind.
///
/// Consumed once: a strategy fetches its own document and drops it when done.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub bytes: Vec<u8>,
    pub charset: Option<String>,
    pub kind: ContentKind,
}

impl RawDocument {
    #[must_use]
    pub fn new(url: impl Into<String>, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        let charset = content_type.and_then(charset_from_content_type);
        let kind = ContentKind::sniff(content_type, &bytes);
        Self {
            url: url.into(),
            bytes,
            charset,
            kind,
        }
    }

    /// Declared encoding, or UTF-8 when none was declared or the label is unknown
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.charset
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }

    /// Decode the payload as text. A BOM overrides the declared charset.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        let (text, _, _) = self.encoding().decode(&self.bytes);
        text
    }
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}
