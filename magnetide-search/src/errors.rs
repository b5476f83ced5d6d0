//! Error types for media search functionality.

use thiserror::Error;

/// Errors that can occur inside a provider adapter.
///
/// These never cross an adapter's `search` boundary; they are rendered into the
/// `error` field of a failed `SearchResponse`.
#[derive(Debug, Error)]
pub enum MediaSearchError {
    /// The caller supplied an empty query, unknown category or bad sort option.
    #[error("Invalid query: {reason}")]
    InvalidQuery {
        /// What was wrong with the request
        reason: String,
    },

    /// Upstream answered with a non-success HTTP status.
    #[error("{provider} API request failed: {status}")]
    UpstreamStatus {
        /// Provider display name
        provider: String,
        /// HTTP status code returned upstream
        status: u16,
    },

    /// Network communication error occurred during search.
    #[error("Network error: {reason}")]
    NetworkError {
        /// The reason for the network error
        reason: String,
    },

    /// Upstream did not answer within the configured timeout.
    #[error("Request to {url} timed out after {timeout_ms} ms")]
    Timeout {
        /// Requested URL
        url: String,
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// Payload was not valid JSON or not the expected structure.
    #[error("Parse error: {reason}")]
    ParseError {
        /// The reason for the parse error
        reason: String,
    },

    /// Upstream reported a failure inside an otherwise successful response.
    #[error("Provider error: {reason}")]
    ProviderError {
        /// Message supplied by the provider
        reason: String,
    },

    /// A poster image could not be fetched or encoded.
    #[error("Poster fetch failed for {url}: {reason}")]
    PosterFetchFailed {
        /// Poster URL
        url: String,
        /// Why the fetch failed
        reason: String,
    },

    /// No adapter is registered under the requested name.
    #[error("Unknown provider: {name}")]
    UnknownProvider {
        /// Name the caller asked for
        name: String,
    },
}

impl MediaSearchError {
    /// Whether this error was caused by caller input rather than upstream.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            MediaSearchError::InvalidQuery { .. } | MediaSearchError::UnknownProvider { .. }
        )
    }

    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        MediaSearchError::InvalidQuery {
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        MediaSearchError::ParseError {
            reason: reason.into(),
        }
    }
}
