//! Provider-agnostic result schema.
//!
//! Wire names follow the JSON the presentation layer already consumes, so some
//! fields are renamed on serialization (`title` is sent as `name` for movies,
//! `magnet_uri` as `magnet`, and so on).

use serde::{Deserialize, Serialize};

/// Outcome marker carried by every search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Search completed, `data` holds the results
    Ok,
    /// Search failed, `error` holds the reason and `data` is empty
    Error,
}

/// Uniform envelope returned by every adapter.
///
/// Fields are private so the status/error invariant holds for every value:
/// `status == Error` exactly when `error` is present, and then `data` is empty
/// and `count` is 0. For successful responses `count == data.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SearchResponseWire<T>")]
pub struct SearchResponse<T> {
    status: ResponseStatus,
    query: String,
    count: usize,
    data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponseWire<T> {
    status: ResponseStatus,
    query: String,
    #[serde(default)]
    count: usize,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> TryFrom<SearchResponseWire<T>> for SearchResponse<T> {
    type Error = String;

    fn try_from(wire: SearchResponseWire<T>) -> Result<Self, Self::Error> {
        match (wire.status, wire.error) {
            (ResponseStatus::Ok, None) => {
                if wire.count != wire.data.len() {
                    return Err(format!(
                        "count {} does not match {} results",
                        wire.count,
                        wire.data.len()
                    ));
                }
                Ok(Self::ok(wire.query, wire.data))
            }
            (ResponseStatus::Error, Some(message)) if wire.data.is_empty() => {
                Ok(Self::error(wire.query, message))
            }
            _ => Err("status and error fields are inconsistent".to_string()),
        }
    }
}

impl<T> SearchResponse<T> {
    /// Successful response holding `data` in upstream order.
    pub fn ok(query: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            query: query.into(),
            count: data.len(),
            data,
            error: None,
        }
    }

    /// Failed response. An empty message is replaced with a generic one.
    pub fn error(query: impl Into<String>, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Unknown error occurred".to_string();
        }
        Self {
            status: ResponseStatus::Error,
            query: query.into(),
            count: 0,
            data: Vec::new(),
            error: Some(message),
        }
    }

    /// Response status.
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Whether the search succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// Query text the response answers.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of results.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Results in upstream order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Failure reason, present only for error responses.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Consumes the response, returning its results.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

/// Torrent record normalized from the generic torrent index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTorrent {
    /// Display name of the provider that produced the record
    pub provider: String,
    /// Provider-local torrent identifier
    pub id: String,
    /// Torrent name
    pub title: String,
    /// Upload time as a UTC date string
    #[serde(rename = "time")]
    pub uploaded_at: String,
    /// Seeder count
    pub seeds: u64,
    /// Leecher count
    pub peers: u64,
    /// Human-readable total size
    #[serde(rename = "size")]
    pub human_size: String,
    /// Magnet link synthesized from the info hash
    #[serde(rename = "magnet")]
    pub magnet_uri: String,
    /// Number of files in the torrent
    #[serde(rename = "numFiles")]
    pub file_count: u64,
    /// Uploader trust status reported upstream
    pub status: String,
    /// Provider category code
    pub category: String,
    /// IMDb identifier when the upstream knows it
    #[serde(rename = "imdb", default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

/// Movie entry from the movie-metadata index with its available torrents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Long title, usually including the year
    #[serde(rename = "name")]
    pub title: String,
    /// Inline `data:` URI of the poster, empty when not requested or unavailable
    #[serde(rename = "cover_image")]
    pub poster: String,
    /// Plot synopsis
    #[serde(rename = "description")]
    pub synopsis: String,
    /// IMDb identifier, empty when unknown
    #[serde(rename = "imdb")]
    pub imdb_id: String,
    /// Release year, 0 when unknown
    pub year: u32,
    /// Spoken language code
    pub language: String,
    /// Torrents in upstream order
    pub torrents: Vec<MovieTorrent>,
}

/// One release of a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieTorrent {
    /// Direct `.torrent` download URL
    #[serde(rename = "torrent_file")]
    pub file_url: String,
    /// Magnet link, empty when upstream gave no hash
    #[serde(rename = "magnet")]
    pub magnet_uri: String,
    /// Resolution label such as `1080p`
    pub quality: String,
    /// Release type such as `bluray` or `web`
    #[serde(rename = "type")]
    pub kind: String,
    /// Seeder count
    pub seeds: u64,
    /// Peer count
    pub peers: u64,
    /// Size as reported upstream
    pub size: String,
    /// Upload date as reported upstream
    #[serde(rename = "upload_date")]
    pub uploaded_at: String,
    /// Info hash, empty when missing
    #[serde(rename = "hash")]
    pub info_hash: String,
}

/// Full description of a single torrent from the generic index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentDetails {
    /// Provider-local torrent identifier
    pub id: String,
    /// Torrent name
    pub title: String,
    /// Info hash
    pub info_hash: String,
    /// Human-readable total size
    pub human_size: String,
    /// Seeder count
    pub seeds: u64,
    /// Leecher count
    pub peers: u64,
    /// Number of files in the torrent
    pub file_count: u64,
    /// Upload time as a UTC date string
    pub uploaded_at: String,
    /// Uploader-supplied description
    pub description: String,
    /// Uploader account name
    pub uploader: String,
    /// Uploader trust status
    pub status: String,
    /// Provider category code
    pub category: String,
    /// IMDb identifier when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Magnet link, empty when the hash is missing
    pub magnet_uri: String,
}
