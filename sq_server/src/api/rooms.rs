//! Room endpoints: lobby listing, create/join/leave, readiness, teams,
//! and game start.

use super::AppState;
use super::response::{respond, respond_empty, success};
use axum::{
    Json,
    extract::{Extension, Path, State},
    response::Response,
};
use sequence_core::AuthedSession;
use sequence_core::game::board::BoardType;
use sequence_core::hub::rooms::CreateRoomParams;
use sequence_core::store::entities::GameMode;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    pub mode: GameMode,
    pub board_type: BoardType,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetReadyRequest {
    pub ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeTeamRequest {
    pub team: u8,
}

/// Lobby projection of every joinable room.
pub async fn list_rooms(State(state): State<AppState>) -> Response {
    success(state.hub.list_rooms().await)
}

pub async fn create_room(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Json(request): Json<CreateRoomRequest>,
) -> Response {
    let params = CreateRoomParams {
        name: request.name,
        mode: request.mode,
        board_type: request.board_type,
        password: request.password,
    };
    respond(state.hub.create_room(&authed.session_id, params).await)
}

pub async fn join_room(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(room_id): Path<Uuid>,
    body: Option<Json<JoinRoomRequest>>,
) -> Response {
    let password = body.and_then(|Json(req)| req.password);
    respond(
        state
            .hub
            .join_room(&authed.session_id, room_id, password.as_deref())
            .await,
    )
}

pub async fn leave_room(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(room_id): Path<Uuid>,
) -> Response {
    respond_empty(state.hub.leave_room(&authed.session_id, room_id).await)
}

pub async fn set_ready(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<SetReadyRequest>,
) -> Response {
    respond_empty(
        state
            .hub
            .set_ready(&authed.session_id, room_id, request.ready)
            .await,
    )
}

pub async fn change_team(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<ChangeTeamRequest>,
) -> Response {
    respond_empty(
        state
            .hub
            .change_team(&authed.session_id, room_id, request.team)
            .await,
    )
}

/// Host-only: fill the empty seats with AIs and start the game.
pub async fn start_game(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(room_id): Path<Uuid>,
) -> Response {
    respond(state.hub.start_game(&authed.session_id, room_id).await)
}
