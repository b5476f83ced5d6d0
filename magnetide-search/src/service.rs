//! Media search service
//!
//! Owns one adapter per upstream index and dispatches requests to them. The
//! service holds no mutable state, so a single instance can be shared across
//! concurrent callers behind an `Arc`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use magnetide_core::config::ProviderConfig;
use serde::Serialize;

use crate::errors::MediaSearchError;
use crate::http::{HttpFetcher, ReqwestFetcher};
use crate::providers::{
    MovieIndexProvider, MovieSearchOptions, SearchProvider, TorrentCategory,
    TorrentIndexProvider, TorrentSearchOptions,
};
use crate::types::{MovieRecord, ResponseStatus, SearchResponse, TorrentDetails, UnifiedTorrent};

/// Registered upstream indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Movie-metadata index (YTS)
    MovieIndex,
    /// Generic torrent index (apibay)
    TorrentIndex,
}

impl ProviderKind {
    /// Short name used in routes and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::MovieIndex => "yts",
            ProviderKind::TorrentIndex => "tpb",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = MediaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yts" | "movies" => Ok(ProviderKind::MovieIndex),
            "tpb" | "piratebay" | "torrents" => Ok(ProviderKind::TorrentIndex),
            _ => Err(MediaSearchError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search addressed to one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRequest {
    /// Movie-metadata index search
    Movies {
        /// Free-text query
        query: String,
        /// Movie index options
        options: MovieSearchOptions,
    },
    /// Generic torrent index search
    Torrents {
        /// Free-text query, ignored for the top-100 category
        query: String,
        /// Torrent index options
        options: TorrentSearchOptions,
    },
}

impl SearchRequest {
    /// Provider this request is addressed to.
    pub fn kind(&self) -> ProviderKind {
        match self {
            SearchRequest::Movies { .. } => ProviderKind::MovieIndex,
            SearchRequest::Torrents { .. } => ProviderKind::TorrentIndex,
        }
    }

    /// Query text as given by the caller.
    pub fn query(&self) -> &str {
        match self {
            SearchRequest::Movies { query, .. } | SearchRequest::Torrents { query, .. } => query,
        }
    }

    /// Cache key of the form `{provider}:{normalized query}:{options}`.
    ///
    /// Queries are trimmed and lowercased; options are rendered in a fixed
    /// order so equivalent requests share a key. Top100 ignores query text, so
    /// its key carries an empty query.
    pub fn cache_key(&self) -> String {
        let query = match self {
            SearchRequest::Torrents { options, .. }
                if options.resolved_category().ok() == Some(TorrentCategory::Top100) =>
            {
                String::new()
            }
            _ => self.query().trim().to_lowercase(),
        };
        let options = match self {
            SearchRequest::Movies { options, .. } => {
                format!("posters={}", options.inline_posters)
            }
            SearchRequest::Torrents { options, .. } => format!(
                "cat={};sort={};order={}",
                normalize_option(options.category.as_deref()),
                normalize_option(options.sort_by.as_deref()),
                normalize_option(options.order.as_deref()),
            ),
        };
        format!("{}:{query}:{options}", self.kind())
    }
}

fn normalize_option(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

/// Response of whichever provider served a [`SearchRequest`].
///
/// Serializes transparently as the inner `SearchResponse`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregatedResponse {
    /// Movie index results
    Movies(SearchResponse<MovieRecord>),
    /// Torrent index results
    Torrents(SearchResponse<UnifiedTorrent>),
}

impl AggregatedResponse {
    /// Response status.
    pub fn status(&self) -> ResponseStatus {
        match self {
            AggregatedResponse::Movies(response) => response.status(),
            AggregatedResponse::Torrents(response) => response.status(),
        }
    }

    /// Whether the search succeeded.
    pub fn is_ok(&self) -> bool {
        self.status() == ResponseStatus::Ok
    }

    /// Number of results.
    pub fn count(&self) -> usize {
        match self {
            AggregatedResponse::Movies(response) => response.count(),
            AggregatedResponse::Torrents(response) => response.count(),
        }
    }

    /// Failure reason for error responses.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            AggregatedResponse::Movies(response) => response.error_message(),
            AggregatedResponse::Torrents(response) => response.error_message(),
        }
    }
}

/// Media search service dispatching to the provider adapters.
#[derive(Debug, Clone)]
pub struct MediaSearchService {
    movies: MovieIndexProvider,
    torrents: TorrentIndexProvider,
}

impl MediaSearchService {
    /// Creates the service with a real HTTP client.
    ///
    /// # Errors
    /// - `MediaSearchError::NetworkError` - HTTP client could not be built
    pub fn new(config: &ProviderConfig) -> Result<Self, MediaSearchError> {
        let fetcher = ReqwestFetcher::new(config.user_agent)?;
        Ok(Self::with_fetcher(Arc::new(fetcher), config))
    }

    /// Creates the service on top of an arbitrary fetcher, e.g. a stub.
    pub fn with_fetcher(fetcher: Arc<dyn HttpFetcher>, config: &ProviderConfig) -> Self {
        Self {
            movies: MovieIndexProvider::new(Arc::clone(&fetcher), config),
            torrents: TorrentIndexProvider::new(fetcher, config),
        }
    }

    /// Runs `request` against its provider.
    pub async fn search(&self, request: &SearchRequest) -> AggregatedResponse {
        match request {
            SearchRequest::Movies { query, options } => {
                AggregatedResponse::Movies(self.search_movies(query, options).await)
            }
            SearchRequest::Torrents { query, options } => {
                AggregatedResponse::Torrents(self.search_torrents(query, options).await)
            }
        }
    }

    /// Searches the movie-metadata index.
    pub async fn search_movies(
        &self,
        query: &str,
        options: &MovieSearchOptions,
    ) -> SearchResponse<MovieRecord> {
        self.movies.search(query, options).await
    }

    /// Searches the generic torrent index.
    pub async fn search_torrents(
        &self,
        query: &str,
        options: &TorrentSearchOptions,
    ) -> SearchResponse<UnifiedTorrent> {
        self.torrents.search(query, options).await
    }

    /// Fetches the full description of one torrent from the generic index.
    ///
    /// # Errors
    /// - `MediaSearchError::InvalidQuery` - Empty id
    /// - `MediaSearchError::UpstreamStatus` / `NetworkError` / `Timeout` - Upstream failed
    /// - `MediaSearchError::ParseError` - Unexpected payload
    pub async fn torrent_details(&self, id: &str) -> Result<TorrentDetails, MediaSearchError> {
        self.torrents.torrent_details(id).await
    }
}

#[cfg(test)]
mod tests {
    use magnetide_core::MagnetideConfig;
    use serde_json::json;

    use super::*;
    use crate::testing::{StubFetcher, StubReply};

    fn service_with(stub: StubFetcher) -> (MediaSearchService, Arc<StubFetcher>) {
        let stub = Arc::new(stub);
        let config = MagnetideConfig::for_testing();
        (
            MediaSearchService::with_fetcher(stub.clone(), &config.providers),
            stub,
        )
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("YTS".parse::<ProviderKind>().unwrap(), ProviderKind::MovieIndex);
        assert_eq!(
            "piratebay".parse::<ProviderKind>().unwrap(),
            ProviderKind::TorrentIndex
        );

        let err = "nyaa".parse::<ProviderKind>().unwrap_err();
        assert!(err.is_caller_error());
        assert_eq!(err.to_string(), "Unknown provider: nyaa");
    }

    #[test]
    fn test_cache_key_normalizes_query_and_options() {
        let a = SearchRequest::Torrents {
            query: "  Big Buck ".to_string(),
            options: TorrentSearchOptions::default().category("Video").sort_by("Seeders"),
        };
        let b = SearchRequest::Torrents {
            query: "big buck".to_string(),
            options: TorrentSearchOptions::default().category("video").sort_by("seeders"),
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "tpb:big buck:cat=video;sort=seeders;order=");

        let movies = SearchRequest::Movies {
            query: "big buck".to_string(),
            options: MovieSearchOptions::with_posters(),
        };
        assert_eq!(movies.cache_key(), "yts:big buck:posters=true");
        assert_ne!(movies.cache_key(), a.cache_key());
    }

    #[test]
    fn test_top100_cache_key_ignores_query_text() {
        let top100 = |query: &str| SearchRequest::Torrents {
            query: query.to_string(),
            options: TorrentSearchOptions::default().category("TOP100"),
        };

        assert_eq!(top100("anything").cache_key(), top100("").cache_key());
        assert_eq!(top100("anything").cache_key(), "tpb::cat=top100;sort=;order=");
    }

    #[tokio::test]
    async fn test_search_dispatches_by_kind() {
        let (service, stub) = service_with(
            StubFetcher::new()
                .route(
                    "http://torrents.test/q.php",
                    StubReply::json_value(&json!([{ "id": "1", "name": "Sintel", "info_hash": "AA" }])),
                )
                .route(
                    "http://movies.test/api/v2/list_movies.json",
                    StubReply::json_value(&json!({
                        "status": "ok",
                        "data": { "movie_count": 0 }
                    })),
                ),
        );

        let torrents = service
            .search(&SearchRequest::Torrents {
                query: "sintel".to_string(),
                options: TorrentSearchOptions::default(),
            })
            .await;
        assert!(matches!(torrents, AggregatedResponse::Torrents(_)));
        assert_eq!(torrents.count(), 1);

        let movies = service
            .search(&SearchRequest::Movies {
                query: "sintel".to_string(),
                options: MovieSearchOptions::default(),
            })
            .await;
        assert!(matches!(movies, AggregatedResponse::Movies(_)));
        assert!(movies.is_ok());
        assert_eq!(movies.count(), 0);

        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn test_aggregated_response_serializes_transparently() {
        let (service, _) = service_with(StubFetcher::new());

        let response = service
            .search(&SearchRequest::Torrents {
                query: String::new(),
                options: TorrentSearchOptions::default(),
            })
            .await;

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["query"], "");
        assert_eq!(value["count"], 0);
        assert_eq!(value["data"], json!([]));
        assert!(value["error"].as_str().unwrap().starts_with("Invalid query"));
    }

    #[tokio::test]
    async fn test_concurrent_searches_share_one_service() {
        let (service, stub) = service_with(StubFetcher::new().route(
            "http://torrents.test/q.php",
            StubReply::json_value(&json!([])),
        ));
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .search_torrents(&format!("query {i}"), &TorrentSearchOptions::default())
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(stub.calls_to("http://torrents.test/q.php"), 8);
    }
}
