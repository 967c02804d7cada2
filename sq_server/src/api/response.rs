//! Response envelope and error mapping.
//!
//! Every request answers `{success: true, data?}` or
//! `{success: false, error}`; the error taxonomy maps onto transport
//! status codes here and nowhere else.

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use sequence_core::{ServerError, ServerResult};
use serde::Serialize;
use serde_json::json;

pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn success_empty() -> Response {
    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}

pub fn failure(err: ServerError) -> Response {
    if let ServerError::Internal(_) = &err {
        log::error!("internal error surfaced to client: {}", err.log_detail());
    }
    (
        status_for(&err),
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}

/// Collapse a hub result into the wire envelope.
pub fn respond<T: Serialize>(result: ServerResult<T>) -> Response {
    match result {
        Ok(data) => success(data),
        Err(err) => failure(err),
    }
}

pub fn respond_empty(result: ServerResult<()>) -> Response {
    match result {
        Ok(()) => success_empty(),
        Err(err) => failure(err),
    }
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::InvalidArg(_) | ServerError::NameReserved => StatusCode::BAD_REQUEST,
        ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
        ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        ServerError::NameTaken | ServerError::Conflict(_) | ServerError::IllegalMove(_) => {
            StatusCode::CONFLICT
        }
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
