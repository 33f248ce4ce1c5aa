//! Plain HTTP endpoints.

use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

const DEFAULT_STORE_ID: i64 = 1;

const BANNER: &str = "\
store-service

Endpoints:
  GET  /store?id=<n>   store info (cached)
  POST /graphql        store CRUD operations
  GET  /metrics        Prometheus metrics
  GET  /health         liveness
";

#[derive(Debug, Deserialize)]
pub struct StoreParams {
    pub id: Option<String>,
}

/// Parse the `id` query value. Absent or empty means store 1.
pub fn parse_store_id(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_STORE_ID),
        Some(value) => value.parse().map_err(|_| ApiError::invalid_store_id()),
    }
}

/// `GET /store`: cache-aside read of one store.
pub async fn get_store(
    State(state): State<AppState>,
    Query(params): Query<StoreParams>,
) -> Result<Response, ApiError> {
    let id = parse_store_id(params.id.as_deref()).map_err(|e| {
        tracing::warn!(raw_id = ?params.id, "invalid store id");
        e
    })?;
    tracing::info!(store_id = id, "store endpoint called");

    let read = state
        .resolver
        .read_store_info(id)
        .await
        .map_err(ApiError::from_read)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (X_CACHE, read.status.as_str()),
        ],
        read.body,
    )
        .into_response())
}

pub async fn health() -> &'static str {
    tracing::info!("health check endpoint called");
    "OK"
}

pub async fn root() -> &'static str {
    BANNER
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
