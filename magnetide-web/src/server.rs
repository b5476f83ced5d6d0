//! JSON API server for Magnetide
//!
//! Builds the shared application state from configuration and serves the
//! search endpoints under `/api`.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use magnetide_core::config::MagnetideConfig;
use magnetide_core::{CacheService, MemoryCache};
use magnetide_search::{
    AggregatedResponse, CachedSearch, MediaSearchError, MediaSearchService, SearchRequest,
    TorrentDetails,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers::{api_search_movies, api_search_torrents, api_torrent_details};

/// Errors that prevent the server from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Search service could not be constructed
    #[error("Failed to initialize search service: {0}")]
    Search(#[from] MediaSearchError),

    /// Listener could not be bound or the server loop failed
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Uncached search service
    pub search_service: Arc<MediaSearchService>,
    /// Read-through cache around `search_service`, when enabled
    pub cached_search: Option<CachedSearch>,
}

impl AppState {
    /// State without caching.
    pub fn new(search_service: Arc<MediaSearchService>) -> Self {
        Self {
            search_service,
            cached_search: None,
        }
    }

    /// State answering searches through `cache` first.
    pub fn with_cache(search_service: Arc<MediaSearchService>, cache: Arc<dyn CacheService>) -> Self {
        let cached_search = CachedSearch::new(Arc::clone(&search_service), cache);
        Self {
            search_service,
            cached_search: Some(cached_search),
        }
    }

    /// Builds the state described by `config`.
    ///
    /// # Errors
    /// - `ServerError::Search` - HTTP client could not be built
    pub fn from_config(config: &MagnetideConfig) -> Result<Self, ServerError> {
        let service = Arc::new(MediaSearchService::new(&config.providers)?);
        if config.cache.enabled {
            let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::from_config(&config.cache));
            Ok(Self::with_cache(service, cache))
        } else {
            Ok(Self::new(service))
        }
    }

    /// Runs a search, through the cache when one is configured.
    pub async fn search(&self, request: &SearchRequest) -> AggregatedResponse {
        match &self.cached_search {
            Some(cached) => cached.search(request).await,
            None => self.search_service.search(request).await,
        }
    }

    /// Looks up torrent details, through the cache when one is configured.
    ///
    /// # Errors
    /// - Propagates `MediaSearchError` from the torrent index
    pub async fn torrent_details(&self, id: &str) -> Result<TorrentDetails, MediaSearchError> {
        match &self.cached_search {
            Some(cached) => cached.torrent_details(id).await,
            None => self.search_service.torrent_details(id).await,
        }
    }
}

/// Router with every API route and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search/yts", get(api_search_movies))
        .route("/api/search/tpb", get(api_search_torrents))
        .route("/api/torrent/{id}", get(api_torrent_details))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds to the configured address and serves until the process exits.
///
/// # Errors
/// - `ServerError::Search` - Search service could not be constructed
/// - `ServerError::Io` - Address could not be bound or serving failed
pub async fn run_server(config: MagnetideConfig) -> Result<(), ServerError> {
    let state = AppState::from_config(&config)?;
    let app = router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        "Magnetide API running on http://{address} (cache {})",
        if config.cache.enabled { "enabled" } else { "disabled" }
    );

    axum::serve(listener, app).await?;
    Ok(())
}
