//! HTTP error responses.
//!
//! Two shapes exist. `GET /store` answers with a single `{"error": ...}`
//! object whose text is fixed. The structured operation surface answers with
//! `{"errors": [{"code", "message"}]}`.
//!
//! Storage failures are logged in full where they happen; the caller only
//! ever sees a generic message.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::resolver::ResolverError;

pub const INVALID_STORE_ID: &str = "Invalid store id";
pub const STORE_NOT_FOUND: &str = "Store not found";
pub const DATABASE_ERROR: &str = "Database error";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Fixed-text error of the read-by-id endpoint.
    Endpoint {
        status: StatusCode,
        message: &'static str,
    },
    /// Error of a structured operation.
    Operation {
        status: StatusCode,
        error: OperationError,
    },
}

impl ApiError {
    pub fn invalid_store_id() -> Self {
        ApiError::Endpoint {
            status: StatusCode::BAD_REQUEST,
            message: INVALID_STORE_ID,
        }
    }

    /// Map a read-by-id failure.
    pub fn from_read(err: ResolverError) -> Self {
        match err {
            ResolverError::Validation(_) => Self::invalid_store_id(),
            ResolverError::NotFound(_) => ApiError::Endpoint {
                status: StatusCode::NOT_FOUND,
                message: STORE_NOT_FOUND,
            },
            ResolverError::Storage(_) => ApiError::Endpoint {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: DATABASE_ERROR,
            },
        }
    }

    /// Map a structured operation failure.
    pub fn from_operation(err: ResolverError) -> Self {
        let (status, code, message) = match err {
            ResolverError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            ResolverError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                ResolverError::NotFound(id).to_string(),
            ),
            ResolverError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                DATABASE_ERROR.to_string(),
            ),
        };
        ApiError::Operation {
            status,
            error: OperationError { code, message },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Endpoint { status, .. } | ApiError::Operation { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Endpoint { status, message } => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                format!("{{\"error\": \"{message}\"}}"),
            )
                .into_response(),
            ApiError::Operation { status, error } => (
                status,
                Json(serde_json::json!({ "errors": [error] })),
            )
                .into_response(),
        }
    }
}
