//! Entity records owned by the storage registry.
//!
//! Entities reference each other by id only (roomId, gameId, playerId,
//! sessionId), never by pointer, so collecting one record can never
//! dangle another. Sanitized view types are the only shapes that leave
//! the server; the raw room password in particular is never serialized.

use crate::game::board::{Board, BoardType, TeamColor};
use crate::game::cards::Card;
use crate::game::detector::Sequence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;
pub type RoomId = Uuid;
pub type GameId = Uuid;

/// Opaque session token: 128 bits of RNG, hex encoded.
pub type SessionId = String;

/// One authenticated player for the lifetime of their connection.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub current_room_id: Option<RoomId>,
    pub current_game_id: Option<GameId>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameMode {
    #[serde(rename = "1v1")]
    OneVsOne,
    #[serde(rename = "2v2")]
    TwoVsTwo,
}

impl GameMode {
    pub fn max_players(self) -> usize {
        match self {
            Self::OneVsOne => 2,
            Self::TwoVsTwo => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Clone, Debug)]
pub struct RoomPlayer {
    pub player_id: PlayerId,
    pub display_name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_ai: bool,
    pub team: u8,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub mode: GameMode,
    pub board_type: BoardType,
    pub password: Option<String>,
    pub status: RoomStatus,
    pub host_id: PlayerId,
    pub players: Vec<RoomPlayer>,
    pub max_players: usize,
    pub created_at: DateTime<Utc>,
    pub game_id: Option<GameId>,
}

impl Room {
    pub fn player(&self, player_id: PlayerId) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut RoomPlayer> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn humans(&self) -> impl Iterator<Item = &RoomPlayer> {
        self.players.iter().filter(|p| !p.is_ai)
    }

    pub fn human_count(&self) -> usize {
        self.humans().count()
    }

    pub fn team_count(&self, team: u8) -> usize {
        self.players.iter().filter(|p| p.team == team).count()
    }

    /// Team for the next joiner: whichever side is short, team 1 on a tie.
    pub fn balanced_team(&self) -> u8 {
        if self.team_count(2) < self.team_count(1) { 2 } else { 1 }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id,
            name: self.name.clone(),
            mode: self.mode,
            board_type: self.board_type,
            has_password: self.password.is_some(),
            status: self.status,
            players: self.players.iter().map(RoomPlayerView::from).collect(),
            max_players: self.max_players,
            host_id: self.host_id,
        }
    }

    pub fn lobby_view(&self) -> LobbyRoomView {
        let host_name = self
            .player(self.host_id)
            .map(|p| p.display_name.clone())
            .unwrap_or_default();
        LobbyRoomView {
            id: self.id,
            name: self.name.clone(),
            mode: self.mode,
            board_type: self.board_type,
            has_password: self.password.is_some(),
            status: self.status,
            players: self.players.len(),
            max_players: self.max_players,
            host_name,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub team: u8,
}

impl From<&RoomPlayer> for RoomPlayerView {
    fn from(p: &RoomPlayer) -> Self {
        Self {
            id: p.player_id,
            name: p.display_name.clone(),
            is_host: p.is_host,
            is_ready: p.is_ready,
            is_ai: p.is_ai,
            team: p.team,
        }
    }
}

/// Sanitized room shape sent to clients; the password never leaves the
/// server, only `has_password`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub name: String,
    pub mode: GameMode,
    pub board_type: BoardType,
    pub has_password: bool,
    pub status: RoomStatus,
    pub players: Vec<RoomPlayerView>,
    pub max_players: usize,
    pub host_id: PlayerId,
}

/// Lobby listing projection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyRoomView {
    pub id: RoomId,
    pub name: String,
    pub mode: GameMode,
    pub board_type: BoardType,
    pub has_password: bool,
    pub status: RoomStatus,
    pub players: usize,
    pub max_players: usize,
    pub host_name: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Finished,
}

#[derive(Clone, Debug)]
pub struct GamePlayer {
    pub player_id: PlayerId,
    pub display_name: String,
    pub team_color: TeamColor,
    pub is_ai: bool,
    pub hand: Vec<Card>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTeam {
    pub team: u8,
    pub color: TeamColor,
    pub player_ids: Vec<PlayerId>,
}

/// One executed move.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub player_id: PlayerId,
    pub card_index: usize,
    pub row: usize,
    pub col: usize,
    pub card_played: Card,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Game {
    pub id: GameId,
    pub room_id: RoomId,
    pub deck_seed: u32,
    pub board_type: BoardType,
    pub status: GameStatus,
    pub players: Vec<GamePlayer>,
    pub teams: Vec<GameTeam>,
    pub board: Board,
    pub sequences: Vec<Sequence>,
    pub current_turn_player_id: PlayerId,
    pub deck_cursor: usize,
    pub shuffled_deck: Vec<Card>,
    pub turn_history: Vec<Turn>,
    pub winner_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    pub fn player(&self, player_id: PlayerId) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut GamePlayer> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.player_id == player_id)
    }

    pub fn humans(&self) -> impl Iterator<Item = &GamePlayer> {
        self.players.iter().filter(|p| !p.is_ai)
    }

    /// Round-robin successor of the current seat.
    pub fn next_player_id(&self) -> Option<PlayerId> {
        let seat = self.seat_of(self.current_turn_player_id)?;
        Some(self.players[(seat + 1) % self.players.len()].player_id)
    }

    /// Opposing team's color from an AI seat's perspective. Both 2v2
    /// opponents share a color, so this is unambiguous.
    pub fn opponent_color_of(&self, color: TeamColor) -> TeamColor {
        match color {
            TeamColor::Green => TeamColor::Blue,
            _ => TeamColor::Green,
        }
    }

    /// Number of turns a player has already taken in this game.
    pub fn turns_taken_by(&self, player_id: PlayerId) -> usize {
        self.turn_history
            .iter()
            .filter(|t| t.player_id == player_id)
            .count()
    }

    /// Full per-recipient snapshot used for reconnection.
    pub fn snapshot_for(&self, player_id: PlayerId) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            room_id: self.room_id,
            deck_seed: self.deck_seed,
            deck_cursor: self.deck_cursor,
            board_type: self.board_type,
            status: self.status,
            players: self.players.iter().map(GamePlayerView::from).collect(),
            teams: self.teams.clone(),
            board: self.board.clone(),
            sequences: self.sequences.clone(),
            current_turn_player_id: self.current_turn_player_id,
            hand: self
                .player(player_id)
                .map(|p| p.hand.clone())
                .unwrap_or_default(),
            turn_count: self.turn_history.len(),
            winner_id: self.winner_id,
        }
    }
}

/// Public roster entry; hands stay private to their owner.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePlayerView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub team_color: TeamColor,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub hand_size: usize,
}

impl From<&GamePlayer> for GamePlayerView {
    fn from(p: &GamePlayer) -> Self {
        Self {
            player_id: p.player_id,
            display_name: p.display_name.clone(),
            team_color: p.team_color,
            is_ai: p.is_ai,
            hand_size: p.hand.len(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: GameId,
    pub room_id: RoomId,
    pub deck_seed: u32,
    pub deck_cursor: usize,
    pub board_type: BoardType,
    pub status: GameStatus,
    pub players: Vec<GamePlayerView>,
    pub teams: Vec<GameTeam>,
    pub board: Board,
    pub sequences: Vec<Sequence>,
    pub current_turn_player_id: PlayerId,
    pub hand: Vec<Card>,
    pub turn_count: usize,
    pub winner_id: Option<PlayerId>,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RematchVote {
    pub player_id: PlayerId,
    pub vote: bool,
}

/// Voting state after a finished game.
#[derive(Clone, Debug)]
pub struct RematchState {
    pub game_id: GameId,
    pub active: bool,
    pub votes: Vec<RematchVote>,
    pub deadline: DateTime<Utc>,
    pub required_votes: usize,
}

impl RematchState {
    /// Insert or overwrite the caller's vote.
    pub fn set_vote(&mut self, player_id: PlayerId, vote: bool) {
        match self.votes.iter_mut().find(|v| v.player_id == player_id) {
            Some(existing) => existing.vote = vote,
            None => self.votes.push(RematchVote { player_id, vote }),
        }
    }

    pub fn yes_votes(&self) -> usize {
        self.votes.iter().filter(|v| v.vote).count()
    }

    pub fn is_approved(&self) -> bool {
        self.yes_votes() >= self.required_votes
    }

    pub fn view(&self) -> RematchStateView {
        RematchStateView {
            game_id: self.game_id,
            active: self.active,
            votes: self.votes.clone(),
            yes_votes: self.yes_votes(),
            required_votes: self.required_votes,
            deadline: self.deadline,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RematchStateView {
    pub game_id: GameId,
    pub active: bool,
    pub votes: Vec<RematchVote>,
    pub yes_votes: usize,
    pub required_votes: usize,
    pub deadline: DateTime<Utc>,
}
