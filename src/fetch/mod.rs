//! Fetch collaborator: one HTTP GET with headers and a timeout
//!
//! The trait does not retry; `fetch_document` layers bounded backoff on top
//! and turns non-success statuses into errors.

pub mod error;
pub mod http;
pub mod retry;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::time::Duration;
use tracing::debug;

use crate::model::RawDocument;
use crate::utils::constants::{ACCEPT_HEADER, ACCEPT_LANGUAGE_HEADER, USER_AGENTS};

pub use error::{FetchError, FetchResult};
pub use http::ReqwestFetcher;
pub use retry::{RetryPolicy, retry_with_backoff};

/// A single GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FetchRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}

/// Status, headers and body of a completed request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// URL the body was served from after redirects, when it differs or is known
    pub final_url: Option<String>,
}

impl FetchResponse {
    /// Value of the first header named `name` (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Consume the response into a raw document for `url`
    #[must_use]
    pub fn into_document(self, url: impl Into<String>) -> RawDocument {
        let content_type = self.content_type().map(str::to_string);
        RawDocument::new(url, self.body, content_type.as_deref())
    }
}

/// Transport able to perform one GET; retries are the caller's concern
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse>;
}

/// Browser-like request headers.
///
/// Uses `user_agent` when given, else a random entry of the pool. The
/// referer is set only when known.
#[must_use]
pub fn request_headers(user_agent: Option<&str>, referer: Option<&str>) -> Vec<(String, String)> {
    let agent = user_agent
        .or_else(|| USER_AGENTS.choose(&mut rand::rng()).copied())
        .unwrap_or_default();

    let mut headers = vec![
        ("User-Agent".to_string(), agent.to_string()),
        ("Accept".to_string(), ACCEPT_HEADER.to_string()),
        ("Accept-Language".to_string(), ACCEPT_LANGUAGE_HEADER.to_string()),
        ("Cache-Control".to_string(), "no-cache".to_string()),
    ];
    if let Some(referer) = referer {
        headers.push(("Referer".to_string(), referer.to_string()));
    }
    headers
}

/// Fetch `request` with retry, failing on any non-2xx status
pub async fn fetch_document(
    fetcher: &dyn Fetcher,
    policy: &RetryPolicy,
    request: &FetchRequest,
) -> FetchResult<RawDocument> {
    let response = retry_with_backoff(policy, || async {
        let response = fetcher.fetch(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(FetchError::Status {
                status: response.status,
                url: request.url.clone(),
            })
        }
    })
    .await?;

    let url = response
        .final_url
        .clone()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| request.url.clone());
    debug!(
        url = %request.url,
        final_url = %url,
        bytes = response.body.len(),
        "Fetched document"
    );
    Ok(response.into_document(url))
}
