//! API handlers for provider searches and torrent details

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use magnetide_search::{
    MovieSearchOptions, SearchRequest, TorrentCategory, TorrentSearchOptions,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::server::AppState;

/// Query string of `/api/search/yts`.
#[derive(Debug, Deserialize)]
pub struct MovieSearchQuery {
    /// Free-text query
    pub query: Option<String>,
}

/// Query string of `/api/search/tpb`.
#[derive(Debug, Deserialize)]
pub struct TorrentSearchQuery {
    /// Free-text query, ignored for `category=Top100`
    pub query: Option<String>,
    /// Category name, `All` when absent
    pub category: Option<String>,
    /// Friendly sort key
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

fn missing_query() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "error", "error": "Missing query parameter" })),
    )
        .into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Movie index search with posters inlined.
pub async fn api_search_movies(
    State(state): State<AppState>,
    Query(params): Query<MovieSearchQuery>,
) -> Response {
    let Some(query) = non_empty(params.query) else {
        return missing_query();
    };

    let request = SearchRequest::Movies {
        query,
        options: MovieSearchOptions::with_posters(),
    };
    Json(state.search(&request).await).into_response()
}

/// Generic torrent index search.
pub async fn api_search_torrents(
    State(state): State<AppState>,
    Query(params): Query<TorrentSearchQuery>,
) -> Response {
    let is_top100 = params
        .category
        .as_deref()
        .and_then(|c| c.parse::<TorrentCategory>().ok())
        == Some(TorrentCategory::Top100);

    let query = match non_empty(params.query) {
        Some(query) => query,
        None if is_top100 => String::new(),
        None => return missing_query(),
    };

    let request = SearchRequest::Torrents {
        query,
        options: TorrentSearchOptions {
            category: non_empty(params.category),
            sort_by: non_empty(params.sort),
            order: non_empty(params.order),
        },
    };
    Json(state.search(&request).await).into_response()
}

/// Full description of one torrent.
pub async fn api_torrent_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.torrent_details(&id).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => {
            warn!("Torrent details for {id} failed: {e}");
            let status = if e.is_caller_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
            };
            (
                status,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
