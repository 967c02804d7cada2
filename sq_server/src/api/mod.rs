//! HTTP/WebSocket request surface.
//!
//! Versioned `/v1` request API plus the `/ws` duplex channel. All
//! mutating requests except join-server, check-name, and the probes
//! require `Authorization: Bearer <sessionId>`; the websocket carries its
//! token as the `sessionId` query parameter instead.

pub mod games;
pub mod middleware;
pub mod players;
pub mod response;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use sequence_core::Hub;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state; cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
}

/// Build the full router:
///
/// ```text
/// GET  /health                          - health probe (public)
/// GET  /ws?sessionId=<token>            - duplex channel
/// GET  /v1/ping                         - server identity (public)
/// POST /v1/check-name                   - name availability (public)
/// POST /v1/join                         - join server (public)
/// POST /v1/leave                        - leave server
/// GET  /v1/session                      - reconnection status
/// GET  /v1/rooms                        - lobby listing
/// POST /v1/rooms                        - create room
/// POST /v1/rooms/{room_id}/join         - join room
/// POST /v1/rooms/{room_id}/leave        - leave room
/// POST /v1/rooms/{room_id}/ready        - set readiness
/// POST /v1/rooms/{room_id}/team         - change team (2v2)
/// POST /v1/rooms/{room_id}/start        - start game (host)
/// POST /v1/games/{game_id}/turn         - play a turn
/// POST /v1/games/{game_id}/rematch      - rematch vote
/// POST /v1/games/{game_id}/rematch/cancel - decline rematch
/// ```
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/ping", get(players::ping))
        .route("/check-name", post(players::check_name))
        .route("/join", post(players::join_server));

    let protected = Router::new()
        .route("/leave", post(players::leave_server))
        .route("/session", get(players::session_status))
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/rooms/{room_id}/join", post(rooms::join_room))
        .route("/rooms/{room_id}/leave", post(rooms::leave_room))
        .route("/rooms/{room_id}/ready", post(rooms::set_ready))
        .route("/rooms/{room_id}/team", post(rooms::change_team))
        .route("/rooms/{room_id}/start", post(rooms::start_game))
        .route("/games/{game_id}/turn", post(games::take_turn))
        .route("/games/{game_id}/rematch", post(games::rematch_vote))
        .route("/games/{game_id}/rematch/cancel", post(games::cancel_rematch))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        // The websocket authenticates itself via query parameter.
        .route("/ws", get(websocket::websocket_handler))
        .nest("/v1", public.merge(protected))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health probe for monitors and load balancers.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.hub.stats().await;
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": stats.sessions,
        "rooms": stats.rooms,
        "games": stats.games,
        "connections": stats.connections,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
