//! Generic torrent index adapter (apibay JSON API).
//!
//! A single upstream request per search, no internal concurrency. Results keep
//! the upstream ranking; sorting happens upstream only when asked for.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use magnetide_core::config::ProviderConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::SearchProvider;
use crate::convert::{
    build_magnet_uri, epoch_to_utc_string, field_int, field_opt_str, field_str, humanize_size,
    non_negative,
};
use crate::errors::MediaSearchError;
use crate::http::{HttpFetcher, fetch_with_timeout};
use crate::types::{SearchResponse, TorrentDetails, UnifiedTorrent};

const PROVIDER_NAME: &str = "ThePirateBay";
const EMPTY_INFO_HASH: &str = "0000000000000000000000000000000000000000";

/// Category filter understood by the torrent index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TorrentCategory {
    /// Every category
    All,
    /// Music and audio books
    Audio,
    /// Movies and TV
    Video,
    /// Software
    Applications,
    /// Games
    Games,
    /// Adult content
    Porn,
    /// Everything else
    Other,
    /// Precompiled top-100 listing, ignores query text
    Top100,
}

impl TorrentCategory {
    /// Every category, in display order.
    pub const ALL: [TorrentCategory; 8] = [
        TorrentCategory::All,
        TorrentCategory::Audio,
        TorrentCategory::Video,
        TorrentCategory::Applications,
        TorrentCategory::Games,
        TorrentCategory::Porn,
        TorrentCategory::Other,
        TorrentCategory::Top100,
    ];

    /// Provider category code for the `cat` query parameter.
    ///
    /// `Top100` has no code: it is served from a separate endpoint.
    pub fn code(self) -> Option<&'static str> {
        match self {
            TorrentCategory::All => Some(""),
            TorrentCategory::Audio => Some("100"),
            TorrentCategory::Video => Some("200"),
            TorrentCategory::Applications => Some("300"),
            TorrentCategory::Games => Some("400"),
            TorrentCategory::Porn => Some("500"),
            TorrentCategory::Other => Some("600"),
            TorrentCategory::Top100 => None,
        }
    }

    /// Canonical name, as accepted by `from_str`.
    pub fn as_str(self) -> &'static str {
        match self {
            TorrentCategory::All => "All",
            TorrentCategory::Audio => "Audio",
            TorrentCategory::Video => "Video",
            TorrentCategory::Applications => "Applications",
            TorrentCategory::Games => "Games",
            TorrentCategory::Porn => "Porn",
            TorrentCategory::Other => "Other",
            TorrentCategory::Top100 => "Top100",
        }
    }
}

impl FromStr for TorrentCategory {
    type Err = MediaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TorrentCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MediaSearchError::invalid_query(format!("Invalid category: {s}")))
    }
}

impl fmt::Display for TorrentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Friendly sort keys and their provider codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Torrent name
    Name,
    /// Upload date
    Date,
    /// Total size
    Size,
    /// Seeder count
    Seeders,
    /// Leecher count
    Leechers,
}

impl SortKey {
    /// Provider code for the `sort` query parameter.
    pub fn code(self) -> &'static str {
        match self {
            SortKey::Name => "1",
            SortKey::Date => "3",
            SortKey::Size => "5",
            SortKey::Seeders => "7",
            SortKey::Leechers => "9",
        }
    }
}

impl FromStr for SortKey {
    type Err = MediaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "date" => Ok(SortKey::Date),
            "size" => Ok(SortKey::Size),
            "seeders" => Ok(SortKey::Seeders),
            "leechers" => Ok(SortKey::Leechers),
            _ => Err(MediaSearchError::invalid_query(format!("Invalid sort key: {s}"))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Value for the `sort_order` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = MediaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(MediaSearchError::invalid_query(format!("Invalid sort order: {s}"))),
        }
    }
}

/// Options accepted by the torrent index, as supplied by the caller.
///
/// Values stay raw strings until the adapter resolves them, so an unknown
/// category surfaces as an error response rather than a type error upstream
/// of the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentSearchOptions {
    /// Category name, defaults to `All`
    pub category: Option<String>,
    /// Friendly sort key (`name`, `date`, `size`, `seeders`, `leechers`)
    pub sort_by: Option<String>,
    /// `asc` or `desc`, only honoured together with `sort_by`
    pub order: Option<String>,
}

impl TorrentSearchOptions {
    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the sort key.
    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    /// Sets the sort order.
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Resolved category, `All` when unset.
    ///
    /// # Errors
    /// - `MediaSearchError::InvalidQuery` - Unknown category name
    pub fn resolved_category(&self) -> Result<TorrentCategory, MediaSearchError> {
        match self.category.as_deref() {
            None => Ok(TorrentCategory::All),
            Some(name) if name.trim().is_empty() => Ok(TorrentCategory::All),
            Some(name) => name.parse(),
        }
    }
}

/// Adapter for the generic torrent index.
#[derive(Debug, Clone)]
pub struct TorrentIndexProvider {
    fetcher: Arc<dyn HttpFetcher>,
    base_url: String,
    request_timeout: Duration,
}

impl TorrentIndexProvider {
    /// Creates the adapter from provider configuration.
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ProviderConfig) -> Self {
        Self {
            fetcher,
            base_url: config.torrent_index_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        }
    }

    /// Builds the upstream URL for a search.
    ///
    /// # Errors
    /// - `MediaSearchError::InvalidQuery` - Empty query, unknown category, sort key or order
    pub fn search_url(
        &self,
        query: &str,
        options: &TorrentSearchOptions,
    ) -> Result<String, MediaSearchError> {
        let category = options.resolved_category()?;
        let Some(code) = category.code() else {
            return Ok(format!("{}/precompiled/data_top100_all.json", self.base_url));
        };

        if query.trim().is_empty() {
            return Err(MediaSearchError::invalid_query("query text must not be empty"));
        }

        let mut url = format!(
            "{}/q.php?q={}&cat={code}",
            self.base_url,
            urlencoding::encode(query)
        );

        let sort_by = options
            .sort_by
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(SortKey::from_str)
            .transpose()?;
        let order = options
            .order
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(SortOrder::from_str)
            .transpose()?;

        match (sort_by, order) {
            (Some(sort_by), Some(order)) => {
                url.push_str(&format!("&sort={}&sort_order={}", sort_by.code(), order.as_str()));
            }
            (Some(sort_by), None) => url.push_str(&format!("&sort={}", sort_by.code())),
            (None, Some(order)) => debug!("Ignoring sort order {order:?} without a sort key"),
            (None, None) => {}
        }

        Ok(url)
    }

    /// Details endpoint URL for a torrent id.
    pub fn details_url(&self, id: &str) -> String {
        format!("{}/t.php?id={}", self.base_url, urlencoding::encode(id))
    }

    async fn try_search(
        &self,
        query: &str,
        options: &TorrentSearchOptions,
    ) -> Result<Vec<UnifiedTorrent>, MediaSearchError> {
        let url = self.search_url(query, options)?;
        let payload = self.fetch_json(&url).await?;

        let Value::Array(torrents) = payload else {
            return Err(MediaSearchError::parse("Invalid response format"));
        };

        Ok(torrents
            .iter()
            .filter(|torrent| !Self::is_empty_placeholder(torrent))
            .map(Self::map_torrent)
            .collect())
    }

    /// Looks up the full description of one torrent.
    ///
    /// # Errors
    /// - `MediaSearchError::InvalidQuery` - Empty id, nothing is requested upstream
    /// - `MediaSearchError::UpstreamStatus` / `NetworkError` / `Timeout` - Upstream failed
    /// - `MediaSearchError::ParseError` - Payload is not a JSON object
    pub async fn torrent_details(&self, id: &str) -> Result<TorrentDetails, MediaSearchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(MediaSearchError::invalid_query("Missing torrent id"));
        }

        let payload = self.fetch_json(&self.details_url(id)).await?;
        if !payload.is_object() {
            return Err(MediaSearchError::parse("Invalid details format"));
        }

        let title = field_str(&payload, "name");
        let info_hash = field_str(&payload, "info_hash");
        let magnet_uri = if info_hash.is_empty() {
            String::new()
        } else {
            build_magnet_uri(&info_hash, &title)
        };

        Ok(TorrentDetails {
            id: field_str(&payload, "id"),
            human_size: humanize_size(&field_str(&payload, "size")),
            seeds: non_negative(field_int(&payload, "seeders")),
            peers: non_negative(field_int(&payload, "leechers")),
            file_count: non_negative(field_int(&payload, "num_files")),
            uploaded_at: epoch_to_utc_string(field_int(&payload, "added")),
            description: field_str(&payload, "descr"),
            uploader: field_str(&payload, "username"),
            status: field_str(&payload, "status"),
            category: field_str(&payload, "category"),
            imdb_id: field_opt_str(&payload, "imdb"),
            title,
            info_hash,
            magnet_uri,
        })
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, MediaSearchError> {
        debug!("Querying {PROVIDER_NAME}: {url}");

        let response = fetch_with_timeout(self.fetcher.as_ref(), url, self.request_timeout).await?;
        if !response.is_success() {
            return Err(MediaSearchError::UpstreamStatus {
                provider: PROVIDER_NAME.to_string(),
                status: response.status,
            });
        }

        response.json()
    }

    /// The index answers an empty search with one placeholder record.
    fn is_empty_placeholder(torrent: &Value) -> bool {
        field_str(torrent, "id") == "0" && field_str(torrent, "info_hash") == EMPTY_INFO_HASH
    }

    fn map_torrent(torrent: &Value) -> UnifiedTorrent {
        let title = field_str(torrent, "name");
        let info_hash = field_str(torrent, "info_hash");

        UnifiedTorrent {
            provider: PROVIDER_NAME.to_string(),
            id: field_str(torrent, "id"),
            uploaded_at: epoch_to_utc_string(field_int(torrent, "added")),
            seeds: non_negative(field_int(torrent, "seeders")),
            peers: non_negative(field_int(torrent, "leechers")),
            human_size: humanize_size(&field_str(torrent, "size")),
            magnet_uri: build_magnet_uri(&info_hash, &title),
            file_count: non_negative(field_int(torrent, "num_files")),
            status: field_str(torrent, "status"),
            category: field_str(torrent, "category"),
            imdb_id: field_opt_str(torrent, "imdb"),
            title,
        }
    }
}

#[async_trait]
impl SearchProvider for TorrentIndexProvider {
    type Options = TorrentSearchOptions;
    type Record = UnifiedTorrent;

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn search(
        &self,
        query: &str,
        options: &TorrentSearchOptions,
    ) -> SearchResponse<UnifiedTorrent> {
        match self.try_search(query, options).await {
            Ok(torrents) => SearchResponse::ok(query, torrents),
            Err(e) => {
                warn!("{PROVIDER_NAME} search for {query:?} failed: {e}");
                SearchResponse::error(query, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use magnetide_core::MagnetideConfig;
    use serde_json::json;

    use super::*;
    use crate::testing::{StubFetcher, StubReply};
    use crate::types::ResponseStatus;

    const SEARCH_URL: &str = "http://torrents.test/q.php";
    const TOP100_URL: &str = "http://torrents.test/precompiled/data_top100_all.json";

    fn build_provider(stub: StubFetcher) -> (TorrentIndexProvider, Arc<StubFetcher>) {
        let stub = Arc::new(stub);
        let config = MagnetideConfig::for_testing();
        (
            TorrentIndexProvider::new(stub.clone(), &config.providers),
            stub,
        )
    }

    fn sample_torrents() -> Value {
        json!([
            {
                "id": "58192",
                "name": "Big Buck Bunny 1080p",
                "info_hash": "DD8255ECDC7CA55FB0BBF81323D87062DB1F6D1C",
                "leechers": "4",
                "seeders": "120",
                "num_files": "3",
                "size": "276134947",
                "username": "blender",
                "added": "1700000000",
                "status": "vip",
                "category": "207",
                "imdb": "tt1254207"
            },
            {
                "id": 77,
                "name": "Elephants Dream",
                "info_hash": "AB12",
                "seeders": null,
                "size": "oops",
                "added": "not a date",
                "imdb": ""
            }
        ])
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!("video".parse::<TorrentCategory>().unwrap(), TorrentCategory::Video);
        assert_eq!(TorrentCategory::Games.code(), Some("400"));
        assert_eq!(TorrentCategory::All.code(), Some(""));
        assert_eq!(TorrentCategory::Top100.code(), None);
        assert!("Anime".parse::<TorrentCategory>().is_err());
    }

    #[test]
    fn test_search_url_variants() {
        let (provider, _) = build_provider(StubFetcher::new());

        assert_eq!(
            provider
                .search_url("big buck", &TorrentSearchOptions::default())
                .unwrap(),
            "http://torrents.test/q.php?q=big%20buck&cat="
        );
        assert_eq!(
            provider
                .search_url(
                    "bunny",
                    &TorrentSearchOptions::default()
                        .category("Video")
                        .sort_by("seeders")
                        .order("desc")
                )
                .unwrap(),
            "http://torrents.test/q.php?q=bunny&cat=200&sort=7&sort_order=desc"
        );
        assert_eq!(
            provider
                .search_url("bunny", &TorrentSearchOptions::default().sort_by("size"))
                .unwrap(),
            "http://torrents.test/q.php?q=bunny&cat=&sort=5"
        );
        // order alone is not meaningful and is dropped
        assert_eq!(
            provider
                .search_url("bunny", &TorrentSearchOptions::default().order("asc"))
                .unwrap(),
            "http://torrents.test/q.php?q=bunny&cat="
        );
        assert_eq!(
            provider
                .search_url("ignored", &TorrentSearchOptions::default().category("Top100"))
                .unwrap(),
            TOP100_URL
        );
    }

    #[test]
    fn test_search_url_rejects_bad_options() {
        let (provider, _) = build_provider(StubFetcher::new());

        for options in [
            TorrentSearchOptions::default().category("Anime"),
            TorrentSearchOptions::default().sort_by("rating"),
            TorrentSearchOptions::default().sort_by("name").order("sideways"),
        ] {
            let err = provider.search_url("bunny", &options).unwrap_err();
            assert!(err.is_caller_error());
        }
    }

    #[tokio::test]
    async fn test_maps_torrents_in_upstream_order() {
        let (provider, stub) =
            build_provider(StubFetcher::new().route(SEARCH_URL, StubReply::json_value(&sample_torrents())));

        let response = provider
            .search("bunny", &TorrentSearchOptions::default())
            .await;

        assert_eq!(response.status(), ResponseStatus::Ok);
        assert_eq!(response.count(), 2);
        assert_eq!(stub.call_count(), 1);

        let first = &response.data()[0];
        assert_eq!(first.provider, "ThePirateBay");
        assert_eq!(first.id, "58192");
        assert_eq!(first.title, "Big Buck Bunny 1080p");
        assert_eq!(first.seeds, 120);
        assert_eq!(first.peers, 4);
        assert_eq!(first.file_count, 3);
        assert_eq!(first.human_size, "263.3 MB");
        assert_eq!(first.uploaded_at, "Tue, 14 Nov 2023 22:13:20 GMT");
        assert_eq!(first.imdb_id.as_deref(), Some("tt1254207"));
        assert!(first.magnet_uri.starts_with(
            "magnet:?xt=urn:btih:DD8255ECDC7CA55FB0BBF81323D87062DB1F6D1C&dn=Big%20Buck%20Bunny%201080p&tr="
        ));

        let second = &response.data()[1];
        assert_eq!(second.id, "77");
        assert_eq!(second.seeds, 0);
        assert_eq!(second.human_size, "0 B");
        assert_eq!(second.uploaded_at, "Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(second.status, "");
        assert_eq!(second.imdb_id, None);
    }

    #[tokio::test]
    async fn test_empty_placeholder_is_dropped() {
        let payload = json!([{
            "id": "0",
            "name": "No results returned",
            "info_hash": EMPTY_INFO_HASH,
            "seeders": "0",
            "size": "0"
        }]);
        let (provider, _) =
            build_provider(StubFetcher::new().route(SEARCH_URL, StubReply::json_value(&payload)));

        let response = provider
            .search("zzzz", &TorrentSearchOptions::default())
            .await;

        assert!(response.is_ok());
        assert_eq!(response.count(), 0);
        assert!(response.data().is_empty());
    }

    #[tokio::test]
    async fn test_top100_ignores_query_text() {
        let (provider, stub) =
            build_provider(StubFetcher::new().route(TOP100_URL, StubReply::json_value(&sample_torrents())));

        let response = provider
            .search("secret words", &TorrentSearchOptions::default().category("Top100"))
            .await;

        assert!(response.is_ok());
        assert_eq!(response.count(), 2);
        let requests = stub.requests();
        assert_eq!(requests, vec![TOP100_URL.to_string()]);
        assert!(!requests[0].contains("secret"));
        assert!(!requests[0].contains("q="));
    }

    #[tokio::test]
    async fn test_invalid_category_makes_no_upstream_call() {
        let (provider, stub) = build_provider(StubFetcher::new());

        let response = provider
            .search("bunny", &TorrentSearchOptions::default().category("Anime"))
            .await;

        assert_eq!(response.status(), ResponseStatus::Error);
        assert!(response.error_message().unwrap().contains("Invalid category"));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_array_payload_is_an_error() {
        let (provider, _) = build_provider(
            StubFetcher::new().route(SEARCH_URL, StubReply::json(200, r#"{"error":"maintenance"}"#)),
        );

        let response = provider
            .search("bunny", &TorrentSearchOptions::default())
            .await;

        assert!(!response.is_ok());
        assert_eq!(response.error_message(), Some("Parse error: Invalid response format"));
    }

    #[tokio::test]
    async fn test_http_failures_are_error_responses() {
        for reply in [
            StubReply::status(404),
            StubReply::status(502),
            StubReply::failure("connection refused"),
            StubReply::delayed(Duration::from_secs(10), StubReply::json(200, "[]")),
        ] {
            let (provider, _) = build_provider(StubFetcher::new().route(SEARCH_URL, reply));

            let response = provider
                .search("bunny", &TorrentSearchOptions::default())
                .await;

            assert_eq!(response.status(), ResponseStatus::Error);
            assert_eq!(response.count(), 0);
            assert!(response.data().is_empty());
            assert!(!response.error_message().unwrap_or_default().is_empty());
        }
    }

    #[tokio::test]
    async fn test_torrent_details() {
        let payload = json!({
            "id": 58192,
            "name": "Big Buck Bunny 1080p",
            "info_hash": "DD8255ECDC7CA55FB0BBF81323D87062DB1F6D1C",
            "seeders": 120,
            "leechers": 4,
            "num_files": 3,
            "size": 1024,
            "added": 0,
            "descr": "Open movie",
            "username": "blender",
            "status": "vip",
            "category": 207,
            "imdb": null
        });
        let (provider, stub) = build_provider(
            StubFetcher::new().route("http://torrents.test/t.php", StubReply::json_value(&payload)),
        );

        let details = tokio_test::assert_ok!(provider.torrent_details("58192").await);

        assert_eq!(stub.requests(), vec!["http://torrents.test/t.php?id=58192".to_string()]);
        assert_eq!(details.id, "58192");
        assert_eq!(details.human_size, "1.0 KB");
        assert_eq!(details.category, "207");
        assert_eq!(details.uploader, "blender");
        assert_eq!(details.imdb_id, None);
        assert!(details.magnet_uri.contains("xt=urn:btih:DD8255EC"));
    }

    #[tokio::test]
    async fn test_torrent_details_errors() {
        let (provider, stub) = build_provider(
            StubFetcher::new().route("http://torrents.test/t.php", StubReply::json(200, "[]")),
        );

        assert!(matches!(
            provider.torrent_details("  ").await,
            Err(MediaSearchError::InvalidQuery { .. })
        ));
        assert_eq!(stub.call_count(), 0);

        assert!(matches!(
            provider.torrent_details("1").await,
            Err(MediaSearchError::ParseError { .. })
        ));
    }
}
