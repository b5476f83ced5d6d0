//! Read-through caching around the search service.
//!
//! Only successful responses are stored. A cache that reports itself
//! unavailable is bypassed and searches go straight upstream.

use std::sync::Arc;
use std::time::Duration;

use magnetide_core::{CacheService, CacheServiceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::MediaSearchError;
use crate::service::{AggregatedResponse, MediaSearchService, SearchRequest};
use crate::types::{SearchResponse, TorrentDetails};

/// [`MediaSearchService`] wrapped with a [`CacheService`].
#[derive(Debug, Clone)]
pub struct CachedSearch {
    service: Arc<MediaSearchService>,
    cache: Arc<dyn CacheService>,
    ttl: Option<Duration>,
}

impl CachedSearch {
    /// Wraps `service`. Entries use the cache's default time-to-live.
    pub fn new(service: Arc<MediaSearchService>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            service,
            cache,
            ttl: None,
        }
    }

    /// Overrides the time-to-live used for stored responses.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Underlying uncached service.
    pub fn service(&self) -> &MediaSearchService {
        &self.service
    }

    /// Runs `request`, answering from cache when a stored response exists.
    pub async fn search(&self, request: &SearchRequest) -> AggregatedResponse {
        let key = request.cache_key();
        match request {
            SearchRequest::Movies { query, options } => AggregatedResponse::Movies(
                self.read_through(&key, query, || self.service.search_movies(query, options))
                    .await,
            ),
            SearchRequest::Torrents { query, options } => AggregatedResponse::Torrents(
                self.read_through(&key, query, || {
                    self.service.search_torrents(query, options)
                })
                .await,
            ),
        }
    }

    /// Torrent details, cached under `details:{id}` on success.
    ///
    /// # Errors
    /// - Whatever [`MediaSearchService::torrent_details`] returns on a miss
    pub async fn torrent_details(&self, id: &str) -> Result<TorrentDetails, MediaSearchError> {
        let key = format!("details:{}", id.trim());
        if self.cache.is_available() {
            if let Some(details) = self.cache.get::<TorrentDetails>(&key).await {
                debug!("Cache hit for {key}");
                return Ok(details);
            }
        }

        let details = self.service.torrent_details(id).await?;
        self.store(&key, &details).await;
        Ok(details)
    }

    /// Cache hits are re-enveloped with this caller's `query`.
    async fn read_through<T, F, Fut>(&self, key: &str, query: &str, fetch: F) -> SearchResponse<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = SearchResponse<T>>,
    {
        if !self.cache.is_available() {
            debug!("Cache unavailable, searching upstream for {key}");
            return fetch().await;
        }

        if let Some(cached) = self.cache.get::<SearchResponse<T>>(key).await {
            debug!("Cache hit for {key}");
            return SearchResponse::ok(query, cached.into_data());
        }

        let response = fetch().await;
        if response.is_ok() {
            self.store(key, &response).await;
        }
        response
    }

    async fn store<T: Serialize + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value, self.ttl).await {
            warn!("Failed to cache {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use magnetide_core::{CoreError, MagnetideConfig, MemoryCache};
    use serde_json::json;

    use super::*;
    use crate::providers::TorrentSearchOptions;
    use crate::testing::{StubFetcher, StubReply};

    const SEARCH_URL: &str = "http://torrents.test/q.php";

    fn cached_with(stub: StubFetcher, cache: Arc<dyn CacheService>) -> (CachedSearch, Arc<StubFetcher>) {
        let stub = Arc::new(stub);
        let config = MagnetideConfig::for_testing();
        let service = MediaSearchService::with_fetcher(stub.clone(), &config.providers);
        (CachedSearch::new(Arc::new(service), cache), stub)
    }

    fn memory_cache() -> Arc<dyn CacheService> {
        Arc::new(MemoryCache::new(16, Duration::from_secs(60)))
    }

    fn torrents_request(query: &str) -> SearchRequest {
        SearchRequest::Torrents {
            query: query.to_string(),
            options: TorrentSearchOptions::default(),
        }
    }

    #[derive(Debug)]
    struct OfflineCache;

    #[async_trait]
    impl CacheService for OfflineCache {
        async fn get_raw(&self, _key: &str) -> Option<String> {
            panic!("offline cache must not be read");
        }

        async fn set_raw(
            &self,
            _key: &str,
            _value: String,
            _ttl: Option<Duration>,
        ) -> Result<(), CoreError> {
            panic!("offline cache must not be written");
        }

        async fn delete(&self, _key: &str) {}

        async fn flush_all(&self) {}

        fn is_available(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_second_search_is_served_from_cache() {
        let payload = json!([{ "id": "7", "name": "Sintel", "info_hash": "AA", "seeders": "3" }]);
        let (cached, stub) = cached_with(
            StubFetcher::new().route(SEARCH_URL, StubReply::json_value(&payload)),
            memory_cache(),
        );

        let first = cached.search(&torrents_request("Sintel")).await;
        let second = cached.search(&torrents_request("  sintel ")).await;

        assert!(first.is_ok());
        assert_eq!(stub.call_count(), 1);
        let (AggregatedResponse::Torrents(first), AggregatedResponse::Torrents(second)) =
            (first, second)
        else {
            panic!("expected torrent responses");
        };
        assert_eq!(first.data(), second.data());
    }

    #[tokio::test]
    async fn test_cache_hit_echoes_callers_query() {
        let payload = json!([{ "id": "7", "name": "Sintel", "info_hash": "AA" }]);
        let (cached, stub) = cached_with(
            StubFetcher::new().route(SEARCH_URL, StubReply::json_value(&payload)),
            memory_cache(),
        );

        let first = cached.search(&torrents_request("SINTEL")).await;
        let second = cached.search(&torrents_request("sintel")).await;

        assert_eq!(stub.call_count(), 1);
        assert_eq!(serde_json::to_value(&first).unwrap()["query"], "SINTEL");
        let second = serde_json::to_value(&second).unwrap();
        assert_eq!(second["query"], "sintel");
        assert_eq!(second["count"], 1);
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let (cached, stub) = cached_with(
            StubFetcher::new().route(SEARCH_URL, StubReply::status(503)),
            memory_cache(),
        );

        for _ in 0..2 {
            let response = cached.search(&torrents_request("sintel")).await;
            assert!(!response.is_ok());
        }
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_cache_is_bypassed() {
        let (cached, stub) = cached_with(
            StubFetcher::new().route(SEARCH_URL, StubReply::json_value(&json!([]))),
            Arc::new(OfflineCache),
        );

        for _ in 0..2 {
            assert!(cached.search(&torrents_request("sintel")).await.is_ok());
        }
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn test_details_are_cached_on_success() {
        let payload = json!({ "id": 7, "name": "Sintel", "info_hash": "AA" });
        let (cached, stub) = cached_with(
            StubFetcher::new().route("http://torrents.test/t.php", StubReply::json_value(&payload)),
            memory_cache(),
        );

        let first = cached.torrent_details("7").await.unwrap();
        let second = cached.torrent_details("7").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stub.call_count(), 1);
    }
}
