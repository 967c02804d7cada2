//! Outbound duplex-channel events.
//!
//! The wire shape is `{type, data, timestamp}`. The tagged union below
//! covers every server-originated message; the fan-out layer stamps the
//! timestamp when it serializes the envelope.

use crate::game::board::{BoardType, Chip, TeamColor};
use crate::game::cards::Card;
use crate::game::detector::Sequence;
use crate::store::entities::{
    GameId, GamePlayerView, GameTeam, PlayerId, RematchStateView, RoomId, RoomPlayerView, RoomView,
};
use chrono::Utc;
use serde::Serialize;

/// Why a player left a room.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveReason {
    Leave,
    Disconnect,
    Kick,
}

/// Why a rematch was cancelled.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RematchCancelReason {
    PlayerDeclined,
    Timeout,
}

/// Per-recipient `game_started` payload: public metadata plus only that
/// recipient's hand.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartedPayload {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub deck_seed: u32,
    pub board_type: BoardType,
    pub players: Vec<GamePlayerView>,
    pub teams: Vec<GameTeam>,
    pub first_player_id: PlayerId,
    pub hand: Vec<Card>,
}

/// Broadcast after every executed move; enough for clients to replay the
/// board mutation without trusting local state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMadePayload {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub card_played: Card,
    pub row: usize,
    pub col: usize,
    /// `None` when a one-eyed Jack cleared the cell.
    pub chip_placed: Option<Chip>,
    pub new_sequences: Vec<Sequence>,
    pub next_player_id: PlayerId,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Connected { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    RoomUpdated { room: RoomView },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        room_id: RoomId,
        player: RoomPlayerView,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        room_id: RoomId,
        player_id: PlayerId,
        reason: LeaveReason,
        new_host_id: Option<PlayerId>,
    },
    GameStarted(GameStartedPayload),
    TurnMade(TurnMadePayload),
    #[serde(rename_all = "camelCase")]
    GameFinished {
        game_id: GameId,
        winner_id: PlayerId,
        winner_name: String,
        winning_team_color: TeamColor,
        final_sequences: Vec<Sequence>,
    },
    #[serde(rename_all = "camelCase")]
    RematchVote { rematch: RematchStateView },
    #[serde(rename_all = "camelCase")]
    RematchStarted { new_game_id: GameId },
    #[serde(rename_all = "camelCase")]
    RematchCancelled { reason: RematchCancelReason },
    Error { message: String },
    Pong,
}

impl ServerEvent {
    /// Wire envelope: `{type, data, timestamp}` with a millisecond epoch
    /// stamp taken at serialization time.
    pub fn to_message(&self) -> String {
        let mut value = match serde_json::to_value(self) {
            Ok(value) => value,
            Err(err) => {
                log::error!("failed to serialize outbound event: {err}");
                serde_json::json!({ "type": "error", "data": { "message": "serialization failure" } })
            }
        };
        value["timestamp"] = serde_json::json!(Utc::now().timestamp_millis());
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn envelope_carries_type_data_timestamp() {
        let event = ServerEvent::Connected {
            player_id: Uuid::new_v4(),
        };
        let value: serde_json::Value = serde_json::from_str(&event.to_message()).unwrap();
        assert_eq!(value["type"], "connected");
        assert!(value["data"]["playerId"].is_string());
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn pong_has_no_data() {
        let value: serde_json::Value =
            serde_json::from_str(&ServerEvent::Pong.to_message()).unwrap();
        assert_eq!(value["type"], "pong");
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn turn_made_payload_shape() {
        let payload = TurnMadePayload {
            game_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            card_played: "JS".parse().unwrap(),
            row: 3,
            col: 7,
            chip_placed: None,
            new_sequences: Vec::new(),
            next_player_id: Uuid::new_v4(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&ServerEvent::TurnMade(payload).to_message()).unwrap();
        assert_eq!(value["type"], "turn_made");
        assert_eq!(value["data"]["cardPlayed"], "JS");
        assert_eq!(value["data"]["chipPlaced"], serde_json::Value::Null);
        assert!(value["data"]["newSequences"].as_array().unwrap().is_empty());
    }
}
