//! Magnetide Search - Normalized torrent search across heterogeneous indexes

#![warn(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Each upstream index gets an adapter that builds its query URL, fetches one
//! JSON payload under a bounded timeout, and normalizes it into a shared result
//! schema. Adapters never fail past their own boundary: every failure becomes
//! a `SearchResponse` with `status = "error"`.

pub mod cached;
pub mod convert;
pub mod errors;
pub mod http;
pub mod providers;
pub mod service;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;

// Re-export main types
pub use cached::CachedSearch;
pub use errors::MediaSearchError;
pub use http::{FetchedResponse, HttpFetcher, ReqwestFetcher};
pub use providers::{
    MovieIndexProvider, MovieSearchOptions, SearchProvider, SortKey, SortOrder, TorrentCategory,
    TorrentIndexProvider, TorrentSearchOptions,
};
pub use service::{AggregatedResponse, MediaSearchService, ProviderKind, SearchRequest};
pub use types::{
    MovieRecord, MovieTorrent, ResponseStatus, SearchResponse, TorrentDetails, UnifiedTorrent,
};

/// Convenience type alias for Results with MediaSearchError.
pub type Result<T> = std::result::Result<T, MediaSearchError>;
