//! Strategy-level errors
//!
//! None of these ever leave the acquisition chain: each one is logged and
//! turned into a diagnostic annotation on the result.

use std::fmt;
use thiserror::Error;

use crate::fetch::FetchError;

/// Failure taxonomy used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network timeout or 5xx, already retried with backoff
    Transient,
    /// The document does not have the expected shape; never retried
    Structural,
    /// Bytes could not be decoded or parsed after every fallback
    Decode,
    /// The rendering session failed
    Render,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Structural => "structural",
            Self::Decode => "decode",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No table-like element in the document
    #[error("No table found in {0}")]
    TableNotFound(String),

    #[error("No download link found on {0}")]
    NoDownloadLink(String),

    /// A download target answered with a page instead of a data file
    #[error("Download target {0} returned markup, not delimited data")]
    MarkupDownload(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("No usable script payload: {0}")]
    Payload(String),

    #[error("Rendered session failed: {0}")]
    Render(String),
}

impl AcquisitionError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(e) if e.is_transient() => FailureKind::Transient,
            Self::Fetch(_)
            | Self::TableNotFound(_)
            | Self::NoDownloadLink(_)
            | Self::MarkupDownload(_)
            | Self::Payload(_) => FailureKind::Structural,
            Self::Decode(_) => FailureKind::Decode,
            Self::Render(_) => FailureKind::Render,
        }
    }

    /// Wrap a rendering collaborator error, keeping its context chain
    #[must_use]
    pub fn render(error: &anyhow::Error) -> Self {
        Self::Render(format!("{error:#}"))
    }
}
