//! Provider adapters for the upstream indexes.

use async_trait::async_trait;

use crate::types::SearchResponse;

pub mod movie_index;
pub mod torrent_index;

pub use movie_index::{MovieIndexProvider, MovieSearchOptions};
pub use torrent_index::{
    SortKey, SortOrder, TorrentCategory, TorrentIndexProvider, TorrentSearchOptions,
};

/// Common contract of every upstream adapter.
///
/// Each provider brings its own option shape and record type. Implementations
/// must never fail past this boundary: caller errors, upstream failures and
/// malformed payloads all come back as an error `SearchResponse`.
#[async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Provider-specific search options.
    type Options: Send + Sync + std::fmt::Debug;
    /// Normalized record produced per result.
    type Record: Send;

    /// Display name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Runs one search against the upstream index.
    async fn search(&self, query: &str, options: &Self::Options) -> SearchResponse<Self::Record>;
}
