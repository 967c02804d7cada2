//! Session-token authentication middleware.
//!
//! Protected routes expect `Authorization: Bearer <sessionId>`. A hit
//! refreshes the session's activity stamp and injects the caller's
//! identity into request extensions for downstream handlers.

use super::AppState;
use super::response::failure;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sequence_core::ServerError;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return failure(ServerError::Unauthorized);
    };

    match state.hub.authenticate(token).await {
        Ok(authed) => {
            request.extensions_mut().insert(authed);
            next.run(request).await
        }
        Err(err) => failure(err),
    }
}
