use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use futures_util::StreamExt;
use serde::Serialize;

use super::AdminState;
use crate::http::server::publish_control;
use crate::lifecycle::{ControlMessage, LifecycleStatus};
use crate::search::{SearchRequest, SearchResult, UrlAssetSearcher};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub lifecycle: LifecycleStatus,
}

#[derive(Serialize)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
}

#[derive(Serialize)]
pub struct CacheReport {
    pub total_entries: usize,
    pub caches: Vec<CacheSummary>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        lifecycle: state.lifecycle.status(),
    })
}

pub async fn get_cache(State(state): State<AdminState>) -> Json<CacheReport> {
    let caches = state
        .store
        .summary()
        .into_iter()
        .map(|(name, entries)| CacheSummary { name, entries })
        .collect();
    Json(CacheReport {
        total_entries: state.store.total_entries(),
        caches,
    })
}

pub async fn post_message(
    State(state): State<AdminState>,
    Json(message): Json<ControlMessage>,
) -> StatusCode {
    publish_control(&state.control, message)
}

/// Malformed or unrecognized bodies are a non-match and answer `[]`.
pub async fn post_search(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<Json<Vec<SearchResult>>, StatusCode> {
    let resolver = state.resolver.clone().ok_or(StatusCode::NOT_FOUND)?;
    let request = SearchRequest::from_slice(&body);

    let results = match UrlAssetSearcher.search_assets(resolver, &request) {
        Some(results) => results.collect().await,
        None => Vec::new(),
    };
    Ok(Json(results))
}
