//! `Fetcher` backed by a shared reqwest client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::trace;

use super::{FetchError, FetchRequest, FetchResponse, FetchResult, Fetcher};
use crate::utils::is_valid_url;

/// HTTP fetcher reusing one connection pool for every request
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with cookie-less, redirect-following defaults
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        // Headers that do not survive validation are dropped rather than failing the request
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        if !is_valid_url(&request.url) {
            return Err(FetchError::InvalidUrl(request.url.clone()));
        }

        let send = self
            .client
            .get(&request.url)
            .headers(header_map(&request.headers))
            .timeout(request.timeout)
            .send();

        let response = match tokio::time::timeout(request.timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(FetchError::Timeout(request.timeout.as_secs()));
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(FetchError::Timeout(request.timeout.as_secs())),
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = match tokio::time::timeout(request.timeout, response.bytes()).await {
            Ok(Ok(bytes)) => bytes.to_vec(),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(FetchError::Timeout(request.timeout.as_secs())),
        };

        trace!(url = %request.url, status, bytes = body.len(), "HTTP response");
        Ok(FetchResponse {
            status,
            headers,
            body,
            final_url: Some(final_url),
        })
    }
}
