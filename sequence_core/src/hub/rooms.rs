//! Room lifecycle: create, join, leave, readiness, teams, lobby listing.

use super::{EventBatch, Hub, room_broadcast};
use crate::errors::{ServerError, ServerResult};
use crate::events::{LeaveReason, ServerEvent};
use crate::game::board::BoardType;
use crate::store::entities::{
    GameMode, LobbyRoomView, PlayerId, Room, RoomId, RoomPlayer, RoomPlayerView, RoomStatus,
    RoomView,
};
use crate::store::registry::Registry;
use chrono::Utc;
use uuid::Uuid;

pub const ROOM_NAME_MIN_LEN: usize = 3;
pub const ROOM_NAME_MAX_LEN: usize = 30;

#[derive(Clone, Debug)]
pub struct CreateRoomParams {
    pub name: String,
    pub mode: GameMode,
    pub board_type: BoardType,
    pub password: Option<String>,
}

fn validate_room_name(name: &str) -> ServerResult<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if !(ROOM_NAME_MIN_LEN..=ROOM_NAME_MAX_LEN).contains(&len) {
        return Err(ServerError::InvalidArg(format!(
            "room name must be {ROOM_NAME_MIN_LEN}-{ROOM_NAME_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

impl Hub {
    /// Create a room with the caller as its sole, ready host on team 1.
    pub async fn create_room(
        &self,
        session_id: &str,
        params: CreateRoomParams,
    ) -> ServerResult<RoomView> {
        let name = validate_room_name(&params.name)?;

        let mut state = self.state().await;
        let session = state.session(session_id)?.clone();
        if session.current_room_id.is_some() {
            return Err(ServerError::Conflict("already in a room".to_string()));
        }

        let room = Room {
            id: Uuid::new_v4(),
            name,
            mode: params.mode,
            board_type: params.board_type,
            password: params.password.filter(|p| !p.is_empty()),
            status: RoomStatus::Waiting,
            host_id: session.player_id,
            players: vec![RoomPlayer {
                player_id: session.player_id,
                display_name: session.display_name.clone(),
                is_host: true,
                is_ready: true,
                is_ai: false,
                team: 1,
                joined_at: Utc::now(),
            }],
            max_players: params.mode.max_players(),
            created_at: Utc::now(),
            game_id: None,
        };
        let view = room.view();

        state.session_mut(session_id)?.current_room_id = Some(room.id);
        log::info!(
            "room '{}' ({}) created by '{}'",
            room.name,
            room.id,
            session.display_name
        );
        state.insert_room(room);
        Ok(view)
    }

    /// Join a waiting room, balancing the joiner onto the short team.
    pub async fn join_room(
        &self,
        session_id: &str,
        room_id: RoomId,
        password: Option<&str>,
    ) -> ServerResult<RoomView> {
        let mut state = self.state().await;
        let session = state.session(session_id)?.clone();
        if session.current_room_id.is_some() {
            return Err(ServerError::Conflict("already in a room".to_string()));
        }

        let room = state.room_mut(room_id)?;
        if room.status != RoomStatus::Waiting {
            return Err(ServerError::Conflict(
                "room is not accepting players".to_string(),
            ));
        }
        if room.is_full() {
            return Err(ServerError::Conflict("room is full".to_string()));
        }
        if room.password.as_deref().is_some_and(|p| Some(p) != password) {
            return Err(ServerError::Conflict("wrong password".to_string()));
        }

        let player = RoomPlayer {
            player_id: session.player_id,
            display_name: session.display_name.clone(),
            is_host: false,
            is_ready: false,
            is_ai: false,
            team: room.balanced_team(),
            joined_at: Utc::now(),
        };
        let joined_view = RoomPlayerView::from(&player);
        room.players.push(player);

        let view = room.view();
        let mut events = room_broadcast(
            room,
            &ServerEvent::PlayerJoined {
                room_id,
                player: joined_view,
            },
        );
        events.extend(room_broadcast(
            room,
            &ServerEvent::RoomUpdated { room: view.clone() },
        ));

        state.session_mut(session_id)?.current_room_id = Some(room_id);
        drop(state);

        self.deliver(events);
        Ok(view)
    }

    /// Leave a room the session is currently in.
    pub async fn leave_room(&self, session_id: &str, room_id: RoomId) -> ServerResult<()> {
        let mut state = self.state().await;
        let session = state.session(session_id)?.clone();
        if session.current_room_id != Some(room_id) {
            return Err(ServerError::Conflict("not in that room".to_string()));
        }

        let events =
            remove_player_from_room(&mut state, room_id, session.player_id, LeaveReason::Leave);
        drop(state);

        self.deliver(events);
        Ok(())
    }

    /// Toggle readiness. The host is pinned ready.
    pub async fn set_ready(&self, session_id: &str, room_id: RoomId, ready: bool) -> ServerResult<()> {
        let mut state = self.state().await;
        let player_id = state.session(session_id)?.player_id;

        let room = state.room_mut(room_id)?;
        let player = room
            .player_mut(player_id)
            .ok_or_else(|| ServerError::Conflict("not in that room".to_string()))?;
        player.is_ready = ready || player.is_host;

        let events = room_broadcast(room, &ServerEvent::RoomUpdated { room: room.view() });
        drop(state);

        self.deliver(events);
        Ok(())
    }

    /// Switch sides in a 2v2 room, refusing when the target side is full.
    pub async fn change_team(&self, session_id: &str, room_id: RoomId, team: u8) -> ServerResult<()> {
        if !matches!(team, 1 | 2) {
            return Err(ServerError::InvalidArg("team must be 1 or 2".to_string()));
        }

        let mut state = self.state().await;
        let player_id = state.session(session_id)?.player_id;

        let room = state.room_mut(room_id)?;
        if room.mode != GameMode::TwoVsTwo {
            return Err(ServerError::Conflict(
                "team changes are only available in 2v2".to_string(),
            ));
        }
        let occupied = room
            .players
            .iter()
            .filter(|p| p.team == team && p.player_id != player_id)
            .count();
        if occupied >= 2 {
            return Err(ServerError::Conflict("team is full".to_string()));
        }
        let player = room
            .player_mut(player_id)
            .ok_or_else(|| ServerError::Conflict("not in that room".to_string()))?;
        player.team = team;

        let events = room_broadcast(room, &ServerEvent::RoomUpdated { room: room.view() });
        drop(state);

        self.deliver(events);
        Ok(())
    }

    /// Lobby projection of every room that is not finished, oldest first.
    pub async fn list_rooms(&self) -> Vec<LobbyRoomView> {
        let state = self.state().await;
        let mut rooms: Vec<&Room> = state
            .rooms()
            .filter(|r| r.status != RoomStatus::Finished)
            .collect();
        rooms.sort_by_key(|r| r.created_at);
        rooms.iter().map(|r| r.lobby_view()).collect()
    }
}

/// Remove a player from a room: clear the session's room link, transfer
/// the host seat to the earliest-joined remaining human, and delete the
/// room when no humans remain. Callers hold the registry lock and deliver
/// the returned events after releasing it.
pub(crate) fn remove_player_from_room(
    state: &mut Registry,
    room_id: RoomId,
    player_id: PlayerId,
    reason: LeaveReason,
) -> EventBatch {
    let Ok(room) = state.room_mut(room_id) else {
        return Vec::new();
    };
    let Some(idx) = room.players.iter().position(|p| p.player_id == player_id) else {
        return Vec::new();
    };
    let removed = room.players.remove(idx);

    let mut new_host_id = None;
    if removed.is_host {
        let successor = room
            .players
            .iter_mut()
            .filter(|p| !p.is_ai)
            .min_by_key(|p| p.joined_at);
        if let Some(host) = successor {
            host.is_host = true;
            host.is_ready = true;
            new_host_id = Some(host.player_id);
        }
        if let Some(host_id) = new_host_id {
            room.host_id = host_id;
        }
    }

    let mut events = room_broadcast(
        room,
        &ServerEvent::PlayerLeft {
            room_id,
            player_id,
            reason,
            new_host_id,
        },
    );
    events.extend(room_broadcast(
        room,
        &ServerEvent::RoomUpdated { room: room.view() },
    ));

    let room_dead = room.human_count() == 0;
    let room_name = room.name.clone();
    if room_dead {
        state.remove_room(room_id);
        log::info!("room '{room_name}' ({room_id}) deleted, no humans remain");
    }

    if let Some(session) = state.session_by_player_mut(player_id) {
        session.current_room_id = None;
    }
    events
}
