//! Game endpoints: the authoritative turn and rematch voting.

use super::AppState;
use super::response::{respond, respond_empty};
use axum::{
    Json,
    extract::{Extension, Path, State},
    response::Response,
};
use sequence_core::AuthedSession;
use sequence_core::store::entities::RematchStateView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub card_index: usize,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Deserialize)]
pub struct RematchVoteRequest {
    pub vote: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RematchVoteResponse {
    pub rematch_state: RematchStateView,
}

pub async fn take_turn(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Response {
    respond_empty(
        state
            .hub
            .take_turn(
                &authed.session_id,
                game_id,
                request.card_index,
                request.row,
                request.col,
            )
            .await,
    )
}

pub async fn rematch_vote(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<RematchVoteRequest>,
) -> Response {
    respond(
        state
            .hub
            .rematch_vote(&authed.session_id, game_id, request.vote)
            .await
            .map(|rematch_state| RematchVoteResponse { rematch_state }),
    )
}

pub async fn cancel_rematch(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedSession>,
    Path(game_id): Path<Uuid>,
) -> Response {
    respond_empty(state.hub.cancel_rematch(&authed.session_id, game_id).await)
}
