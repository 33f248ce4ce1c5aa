//! Structured CRUD surface: `POST /graphql`.
//!
//! Request: `{"operation": "<name>", "arguments": {...}}`.
//! Success: `200 {"data": {"<name>": <result>}}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::resolver::{Operation, ResolverError};

#[derive(Debug, Deserialize)]
pub struct OperationRequest {
    pub operation: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Browsers call this endpoint cross-origin.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "malformed operation request");
        ApiError::from_operation(ResolverError::Validation(rejection.body_text()))
    })?;

    let operation = Operation::parse(&request.operation, &request.arguments).map_err(|e| {
        tracing::error!(operation = %request.operation, error = %e, "invalid operation arguments");
        ApiError::from_operation(e)
    })?;
    let name = operation.name();

    let output = state
        .resolver
        .execute(operation)
        .await
        .map_err(ApiError::from_operation)?;

    let mut data = Map::new();
    data.insert(
        name.to_string(),
        serde_json::to_value(output).unwrap_or(Value::Null),
    );
    Ok(Json(serde_json::json!({ "data": data })))
}
