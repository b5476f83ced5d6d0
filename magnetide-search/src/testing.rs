//! Stub upstream for tests.
//!
//! [`StubFetcher`] answers requests from a table of URL prefixes and records
//! every URL it was asked for, so tests can assert both on normalization and
//! on how many upstream calls an adapter made.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::MediaSearchError;
use crate::http::{FetchedResponse, HttpFetcher};

/// Canned answer for a stubbed route.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Return this response
    Respond(FetchedResponse),
    /// Fail with a network error carrying this reason
    Fail(String),
    /// Wait, then answer with the inner reply
    Delayed(Duration, Box<StubReply>),
}

impl StubReply {
    /// JSON body with the given status.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        StubReply::Respond(FetchedResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: body.into().into_bytes(),
        })
    }

    /// Serialized JSON value with status 200.
    pub fn json_value(value: &Value) -> Self {
        Self::json(200, value.to_string())
    }

    /// Arbitrary bytes, e.g. an image.
    pub fn bytes(status: u16, content_type: Option<&str>, body: Vec<u8>) -> Self {
        StubReply::Respond(FetchedResponse {
            status,
            content_type: content_type.map(str::to_string),
            body,
        })
    }

    /// Empty body with the given status.
    pub fn status(status: u16) -> Self {
        Self::bytes(status, None, Vec::new())
    }

    /// Transport failure.
    pub fn failure(reason: impl Into<String>) -> Self {
        StubReply::Fail(reason.into())
    }

    /// Answer with `reply` after `delay`.
    pub fn delayed(delay: Duration, reply: StubReply) -> Self {
        StubReply::Delayed(delay, Box::new(reply))
    }
}

/// Prefix-routed fake upstream. Unrouted URLs answer 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
    routes: Vec<(String, StubReply)>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    /// Creates a stub with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route. The longest matching prefix wins.
    pub fn route(mut self, prefix: impl Into<String>, reply: StubReply) -> Self {
        self.routes.push((prefix.into(), reply));
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Total number of requests.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests whose URL starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    fn reply_for(&self, url: &str) -> StubReply {
        self.routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| StubReply::status(404))
    }
}

#[async_trait]
impl HttpFetcher for StubFetcher {
    async fn get(&self, url: &str) -> Result<FetchedResponse, MediaSearchError> {
        self.requests.lock().push(url.to_string());

        let mut reply = self.reply_for(url);
        loop {
            match reply {
                StubReply::Respond(response) => return Ok(response),
                StubReply::Fail(reason) => return Err(MediaSearchError::NetworkError { reason }),
                StubReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
