//! Extraction results and their diagnostic metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::Record;

/// The ways a category's data can be acquired, in default priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquisitionMethod {
    #[serde(rename = "Static Parse")]
    StaticParse,
    #[serde(rename = "File Download")]
    FileDownload,
    #[serde(rename = "Embedded Payload")]
    EmbeddedPayload,
    #[serde(rename = "Rendered Session")]
    RenderedSession,
}

impl AcquisitionMethod {
    /// Default chain order: cheapest first, browser last
    pub const DEFAULT_ORDER: [Self; 4] = [
        Self::StaticParse,
        Self::FileDownload,
        Self::EmbeddedPayload,
        Self::RenderedSession,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StaticParse => "Static Parse",
            Self::FileDownload => "File Download",
            Self::EmbeddedPayload => "Embedded Payload",
            Self::RenderedSession => "Rendered Session",
        }
    }

    /// Parse a method from its label or a short alias (`static`, `download`, `payload`, `rendered`)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::DEFAULT_ORDER.into_iter().find(|method| {
            method.label().eq_ignore_ascii_case(&lowered)
                || match method {
                    Self::StaticParse => matches!(lowered.as_str(), "static" | "html"),
                    Self::FileDownload => matches!(lowered.as_str(), "download" | "csv" | "file"),
                    Self::EmbeddedPayload => matches!(lowered.as_str(), "payload" | "json" | "script"),
                    Self::RenderedSession => matches!(lowered.as_str(), "rendered" | "browser"),
                }
        })
    }
}

impl fmt::Display for AcquisitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a single strategy attempt ended when it did not produce data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyOutcome {
    Failed,
    Empty,
    Skipped,
}

/// Annotation left by a strategy that did not produce the final data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDiagnostic {
    pub method: AcquisitionMethod,
    pub outcome: StrategyOutcome,
    pub message: String,
}

/// Diagnostic metadata attached to every result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Strategy that produced the records, if any did
    pub method: Option<AcquisitionMethod>,
    pub row_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_clicks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<StrategyDiagnostic>,
    /// Terminal error, set only when no strategy and no cache entry produced data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub recovered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovered_at: Option<DateTime<Utc>>,
}

/// Outcome of one category run: the unit that is persisted and cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub category: String,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
    pub metadata: ExtractionMetadata,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub filters: serde_json::Map<String, serde_json::Value>,
    pub records: Vec<Record>,
}

impl ExtractionResult {
    #[must_use]
    pub fn new(category: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            source_url: source_url.into(),
            extracted_at: Utc::now(),
            metadata: ExtractionMetadata::default(),
            filters: serde_json::Map::new(),
            records: Vec::new(),
        }
    }

    /// Terminal failure: no records and an explicit error
    #[must_use]
    pub fn failed(
        category: impl Into<String>,
        source_url: impl Into<String>,
        error: impl Into<String>,
        diagnostics: Vec<StrategyDiagnostic>,
    ) -> Self {
        let mut result = Self::new(category, source_url);
        result.metadata.error = Some(error.into());
        result.metadata.diagnostics = diagnostics;
        result
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.records.is_empty() && self.metadata.error.is_none()
    }

    /// Mark a cached result as served from the recovery cache
    pub fn mark_recovered(&mut self, at: DateTime<Utc>) {
        self.metadata.recovered = true;
        self.metadata.recovered_at = Some(at);
    }
}
