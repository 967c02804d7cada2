//! Session endpoints: ping, name probing, join/leave, reconnection
//! status.

use super::AppState;
use super::response::{respond, respond_empty, success};
use axum::{Json, extract::{Extension, State}, response::Response};
use sequence_core::AuthedSession;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// Liveness probe with server identity; no auth required.
pub async fn ping(State(state): State<AppState>) -> Response {
    success(json!({
        "ok": true,
        "serverName": state.hub.config().server_name.clone(),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp_millis(),
    }))
}

/// Validation-only availability probe for a display name.
pub async fn check_name(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> Response {
    success(state.hub.check_name(&request.name).await)
}

/// Register a player and issue session + player ids.
pub async fn join_server(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> Response {
    respond(state.hub.join_server(&request.name).await)
}

/// Destroy the caller's session, leaving any room first.
pub async fn leave_server(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
) -> Response {
    respond_empty(state.hub.leave_server(&authed.session_id).await)
}

/// Reconnection snapshot: room/game links plus full game state.
pub async fn session_status(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
) -> Response {
    respond(state.hub.session_status(&authed.session_id).await)
}
