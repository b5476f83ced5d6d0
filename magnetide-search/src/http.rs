//! HTTP fetch seam shared by all adapters.
//!
//! Adapters only ever issue plain GET requests and need the status, the
//! content type and the raw body back. Keeping that behind [`HttpFetcher`]
//! lets tests replay canned upstream responses and count calls.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::MediaSearchError;

/// Raw upstream response.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code
    pub status: u16,
    /// `content-type` header, if present
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as untyped JSON.
    ///
    /// # Errors
    /// - `MediaSearchError::ParseError` - Body is not valid JSON
    pub fn json(&self) -> Result<Value, MediaSearchError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| MediaSearchError::parse(format!("invalid JSON payload: {e}")))
    }
}

/// Minimal GET-only HTTP client.
#[async_trait]
pub trait HttpFetcher: Send + Sync + std::fmt::Debug {
    /// Fetches `url`. Non-2xx statuses are returned, not raised.
    ///
    /// # Errors
    /// - `MediaSearchError::NetworkError` - Connection or transfer failed
    async fn get(&self, url: &str) -> Result<FetchedResponse, MediaSearchError>;
}

/// Issues a GET through `fetcher`, cancelling it once `timeout` elapses.
///
/// # Errors
/// - `MediaSearchError::Timeout` - No response within `timeout`
/// - `MediaSearchError::NetworkError` - Propagated from the fetcher
pub async fn fetch_with_timeout(
    fetcher: &dyn HttpFetcher,
    url: &str,
    timeout: Duration,
) -> Result<FetchedResponse, MediaSearchError> {
    tokio::time::timeout(timeout, fetcher.get(url))
        .await
        .map_err(|_| MediaSearchError::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })?
}

/// Production fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Creates a fetcher sending `user_agent` on every request.
    ///
    /// # Errors
    /// - `MediaSearchError::NetworkError` - TLS backend or client setup failed
    pub fn new(user_agent: &str) -> Result<Self, MediaSearchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| MediaSearchError::NetworkError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchedResponse, MediaSearchError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| MediaSearchError::NetworkError {
                    reason: format!("request to {url} failed: {e}"),
                })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| MediaSearchError::NetworkError {
                reason: format!("reading body from {url} failed: {e}"),
            })?;

        Ok(FetchedResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
