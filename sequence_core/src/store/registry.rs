//! In-memory storage registry.
//!
//! Owns every entity record. Secondary indices: session by id, session by
//! player id, lower-cased display name presence, room by id, game by id,
//! rematch state by game id. Name reservation and release are atomic with
//! session insertion and removal. Mutators either succeed or return a
//! precise error; missing keys never panic.

use super::entities::{Game, GameId, PlayerId, RematchState, Room, RoomId, Session, SessionId};
use crate::errors::{ServerError, ServerResult};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<SessionId, Session>,
    session_by_player: HashMap<PlayerId, SessionId>,
    reserved_names: HashSet<String>,
    rooms: HashMap<RoomId, Room>,
    games: HashMap<GameId, Game>,
    rematch_states: HashMap<GameId, RematchState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- sessions ----------------------------------------------------------

    pub fn name_available(&self, name: &str) -> bool {
        !self.reserved_names.contains(&name.to_lowercase())
    }

    /// Insert a session, reserving its display name atomically.
    pub fn insert_session(&mut self, session: Session) -> ServerResult<()> {
        let key = session.display_name.to_lowercase();
        if self.reserved_names.contains(&key) {
            return Err(ServerError::NameTaken);
        }
        self.reserved_names.insert(key);
        self.session_by_player
            .insert(session.player_id, session.id.clone());
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    pub fn session(&self, id: &str) -> ServerResult<&Session> {
        self.sessions.get(id).ok_or(ServerError::Unauthorized)
    }

    pub fn session_mut(&mut self, id: &str) -> ServerResult<&mut Session> {
        self.sessions.get_mut(id).ok_or(ServerError::Unauthorized)
    }

    pub fn session_by_player(&self, player_id: PlayerId) -> Option<&Session> {
        self.session_by_player
            .get(&player_id)
            .and_then(|id| self.sessions.get(id))
    }

    pub fn session_by_player_mut(&mut self, player_id: PlayerId) -> Option<&mut Session> {
        let id = self.session_by_player.get(&player_id)?.clone();
        self.sessions.get_mut(&id)
    }

    /// Remove a session, releasing its display name.
    pub fn remove_session(&mut self, id: &str) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        self.session_by_player.remove(&session.player_id);
        self.reserved_names
            .remove(&session.display_name.to_lowercase());
        Some(session)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Sessions idle since `cutoff`, for the GC sweep.
    pub fn idle_sessions(&self, cutoff: DateTime<Utc>) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.last_activity < cutoff)
            .map(|s| s.id.clone())
            .collect()
    }

    // -- rooms -------------------------------------------------------------

    pub fn insert_room(&mut self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    pub fn room(&self, id: RoomId) -> ServerResult<&Room> {
        self.rooms.get(&id).ok_or(ServerError::NotFound("room"))
    }

    pub fn room_mut(&mut self, id: RoomId) -> ServerResult<&mut Room> {
        self.rooms.get_mut(&id).ok_or(ServerError::NotFound("room"))
    }

    pub fn remove_room(&mut self, id: RoomId) -> Option<Room> {
        self.rooms.remove(&id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn empty_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .values()
            .filter(|r| r.players.is_empty())
            .map(|r| r.id)
            .collect()
    }

    // -- games -------------------------------------------------------------

    pub fn insert_game(&mut self, game: Game) {
        self.games.insert(game.id, game);
    }

    pub fn game(&self, id: GameId) -> ServerResult<&Game> {
        self.games.get(&id).ok_or(ServerError::NotFound("game"))
    }

    pub fn game_mut(&mut self, id: GameId) -> ServerResult<&mut Game> {
        self.games.get_mut(&id).ok_or(ServerError::NotFound("game"))
    }

    pub fn remove_game(&mut self, id: GameId) -> Option<Game> {
        self.games.remove(&id)
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Games idle since `cutoff`, candidates for the inactive-game sweep.
    pub fn idle_games(&self, cutoff: DateTime<Utc>) -> Vec<GameId> {
        self.games
            .values()
            .filter(|g| g.last_activity_at < cutoff)
            .map(|g| g.id)
            .collect()
    }

    // -- rematch states ----------------------------------------------------

    pub fn insert_rematch(&mut self, state: RematchState) {
        self.rematch_states.insert(state.game_id, state);
    }

    pub fn rematch(&self, game_id: GameId) -> Option<&RematchState> {
        self.rematch_states.get(&game_id)
    }

    pub fn rematch_mut(&mut self, game_id: GameId) -> Option<&mut RematchState> {
        self.rematch_states.get_mut(&game_id)
    }

    pub fn remove_rematch(&mut self, game_id: GameId) -> Option<RematchState> {
        self.rematch_states.remove(&game_id)
    }

    /// Rematch states whose deadline has passed without approval.
    pub fn expired_rematches(&self, now: DateTime<Utc>) -> Vec<GameId> {
        self.rematch_states
            .values()
            .filter(|s| now > s.deadline && !s.is_approved())
            .map(|s| s.game_id)
            .collect()
    }
}
