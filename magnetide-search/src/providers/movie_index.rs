//! Movie-metadata index adapter (YTS list API).
//!
//! One list request per search, then every movie is normalized concurrently.
//! Posters are optionally inlined as `data:` URIs; a failed poster fetch only
//! blanks that movie's poster and never fails the search.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::join_all;
use magnetide_core::config::ProviderConfig;
use serde_json::Value;
use tracing::{debug, warn};

use super::SearchProvider;
use crate::convert::{build_magnet_uri, field_int, field_str, non_negative};
use crate::errors::MediaSearchError;
use crate::http::{HttpFetcher, fetch_with_timeout};
use crate::types::{MovieRecord, MovieTorrent, SearchResponse};

const PROVIDER_NAME: &str = "YTS";
const DEFAULT_POSTER_CONTENT_TYPE: &str = "image/jpeg";

/// Options accepted by the movie index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovieSearchOptions {
    /// Fetch each movie's poster and embed it as a `data:` URI
    pub inline_posters: bool,
}

impl MovieSearchOptions {
    /// Options with poster inlining enabled.
    pub fn with_posters() -> Self {
        Self {
            inline_posters: true,
        }
    }
}

/// Adapter for the movie-metadata index.
#[derive(Debug, Clone)]
pub struct MovieIndexProvider {
    fetcher: Arc<dyn HttpFetcher>,
    base_url: String,
    request_timeout: Duration,
    poster_timeout: Duration,
}

impl MovieIndexProvider {
    /// Creates the adapter from provider configuration.
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ProviderConfig) -> Self {
        Self {
            fetcher,
            base_url: config.movie_index_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            poster_timeout: config.poster_timeout,
        }
    }

    /// List endpoint URL for `query`, sorted by popularity.
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2/list_movies.json?query_term={}&sort_by=download_count",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    async fn try_search(
        &self,
        query: &str,
        options: &MovieSearchOptions,
    ) -> Result<Vec<MovieRecord>, MediaSearchError> {
        if query.trim().is_empty() {
            return Err(MediaSearchError::invalid_query("query text must not be empty"));
        }

        let url = self.search_url(query);
        debug!("Querying {PROVIDER_NAME}: {url}");

        let response = fetch_with_timeout(self.fetcher.as_ref(), &url, self.request_timeout).await?;
        if !response.is_success() {
            return Err(MediaSearchError::UpstreamStatus {
                provider: PROVIDER_NAME.to_string(),
                status: response.status,
            });
        }

        let payload = response.json()?;
        let movies = Self::extract_movies(&payload)?;

        let records = join_all(
            movies
                .iter()
                .map(|movie| self.map_movie(movie, options.inline_posters)),
        )
        .await;

        Ok(records)
    }

    /// Pulls the movie list out of the envelope. An explicit zero count or a
    /// missing `movies` list yields no movies; otherwise the count is not
    /// trusted and `movies` is mapped as given.
    fn extract_movies(payload: &Value) -> Result<&[Value], MediaSearchError> {
        if field_str(payload, "status") == "error" {
            let message = field_str(payload, "status_message");
            return Err(MediaSearchError::ProviderError {
                reason: if message.is_empty() {
                    "upstream reported an error".to_string()
                } else {
                    message
                },
            });
        }

        let data = payload
            .get("data")
            .filter(|data| data.is_object())
            .ok_or_else(|| MediaSearchError::parse("Invalid response format: missing data"))?;

        let zero_count = data.get("movie_count").is_some_and(|count| {
            count.as_u64() == Some(0) || count.as_str().is_some_and(|s| s.trim() == "0")
        });
        if zero_count {
            return Ok(&[]);
        }

        match data.get("movies") {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(movies)) => Ok(movies),
            _ => Err(MediaSearchError::parse(
                "Invalid response format: movies is not a list",
            )),
        }
    }

    async fn map_movie(&self, movie: &Value, inline_posters: bool) -> MovieRecord {
        let mut title = field_str(movie, "title_long");
        if title.is_empty() {
            title = field_str(movie, "title");
        }

        let poster = match movie.get("large_cover_image").and_then(Value::as_str) {
            Some(url) if inline_posters && !url.is_empty() => {
                self.fetch_poster(url).await.unwrap_or_else(|e| {
                    warn!("Keeping {title:?} without poster: {e}");
                    String::new()
                })
            }
            _ => String::new(),
        };

        let torrents = match movie.get("torrents") {
            Some(Value::Array(torrents)) => torrents
                .iter()
                .map(|torrent| Self::map_torrent(torrent, &title))
                .collect(),
            _ => Vec::new(),
        };

        MovieRecord {
            poster,
            synopsis: field_str(movie, "synopsis"),
            imdb_id: field_str(movie, "imdb_code"),
            year: u32::try_from(field_int(movie, "year")).unwrap_or(0),
            language: field_str(movie, "language"),
            torrents,
            title,
        }
    }

    fn map_torrent(torrent: &Value, display_name: &str) -> MovieTorrent {
        let info_hash = field_str(torrent, "hash");
        let magnet_uri = if info_hash.is_empty() {
            String::new()
        } else {
            build_magnet_uri(&info_hash, display_name)
        };

        MovieTorrent {
            file_url: field_str(torrent, "url"),
            magnet_uri,
            quality: field_str(torrent, "quality"),
            kind: field_str(torrent, "type"),
            seeds: non_negative(field_int(torrent, "seeds")),
            peers: non_negative(field_int(torrent, "peers")),
            size: field_str(torrent, "size"),
            uploaded_at: field_str(torrent, "date_uploaded"),
            info_hash,
        }
    }

    /// Downloads a poster and encodes it as a `data:` URI.
    async fn fetch_poster(&self, url: &str) -> Result<String, MediaSearchError> {
        let failed = |reason: String| MediaSearchError::PosterFetchFailed {
            url: url.to_string(),
            reason,
        };

        let response = fetch_with_timeout(self.fetcher.as_ref(), url, self.poster_timeout)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.is_success() {
            return Err(failed(format!("HTTP {}", response.status)));
        }

        let content_type = response
            .content_type
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_POSTER_CONTENT_TYPE)
            .to_lowercase();

        Ok(format!(
            "data:{content_type};base64,{}",
            STANDARD.encode(&response.body)
        ))
    }
}

#[async_trait]
impl SearchProvider for MovieIndexProvider {
    type Options = MovieSearchOptions;
    type Record = MovieRecord;

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn search(&self, query: &str, options: &MovieSearchOptions) -> SearchResponse<MovieRecord> {
        match self.try_search(query, options).await {
            Ok(movies) => SearchResponse::ok(query, movies),
            Err(e) => {
                warn!("{PROVIDER_NAME} search for {query:?} failed: {e}");
                SearchResponse::error(query, e.to_string())
            }
        }
    }
}
