//! Centralized configuration for Magnetide.
//!
//! All upstream endpoints, timeouts and cache settings are defined here to
//! avoid hard-coded values scattered throughout the adapters.

use std::time::Duration;

/// Central configuration for all Magnetide components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct MagnetideConfig {
    pub providers: ProviderConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

/// Upstream provider endpoints and request limits.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the movie-metadata index
    pub movie_index_url: String,
    /// Base URL of the generic torrent index
    pub torrent_index_url: String,
    /// Timeout for the primary query of a search
    pub request_timeout: Duration,
    /// Timeout for a single poster image fetch
    pub poster_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            movie_index_url: "https://yts.am".to_string(),
            torrent_index_url: "https://apibay.org".to_string(),
            request_timeout: Duration::from_secs(10),
            poster_timeout: Duration::from_secs(5),
            user_agent: "magnetide/0.1.0",
        }
    }
}

/// Search result caching.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether callers should wrap searches with a cache
    pub enabled: bool,
    /// Maximum number of cached responses
    pub capacity: usize,
    /// Time-to-live applied to cached responses
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 256,
            ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// JSON API server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl MagnetideConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Values that fail to parse are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("MAGNETIDE_MOVIE_INDEX_URL") {
            config.providers.movie_index_url = url;
        }

        if let Ok(url) = std::env::var("MAGNETIDE_TORRENT_INDEX_URL") {
            config.providers.torrent_index_url = url;
        }

        if let Some(timeout) = env_seconds("MAGNETIDE_REQUEST_TIMEOUT") {
            config.providers.request_timeout = timeout;
        }

        if let Some(timeout) = env_seconds("MAGNETIDE_POSTER_TIMEOUT") {
            config.providers.poster_timeout = timeout;
        }

        if let Some(enabled) = std::env::var("MAGNETIDE_CACHE_ENABLED")
            .ok()
            .and_then(|value| value.parse::<bool>().ok())
        {
            config.cache.enabled = enabled;
        }

        if let Some(ttl) = env_seconds("MAGNETIDE_CACHE_TTL") {
            config.cache.ttl = ttl;
        }

        if let Ok(capacity) = std::env::var("MAGNETIDE_CACHE_CAPACITY") {
            if let Ok(count) = capacity.parse::<usize>() {
                config.cache.capacity = count;
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            providers: ProviderConfig {
                movie_index_url: "http://movies.test".to_string(),
                torrent_index_url: "http://torrents.test".to_string(),
                request_timeout: Duration::from_millis(500),
                poster_timeout: Duration::from_millis(200),
                ..Default::default()
            },
            cache: CacheConfig {
                enabled: true,
                capacity: 16,
                ttl: Duration::from_secs(60),
            },
            server: ServerConfig::default(),
        }
    }
}

fn env_seconds(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}
