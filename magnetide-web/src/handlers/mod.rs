//! HTTP request handlers organized by functionality

pub mod api;

// Re-export handler functions
pub use api::{
    MovieSearchQuery, TorrentSearchQuery, api_search_movies, api_search_torrents,
    api_torrent_details,
};
