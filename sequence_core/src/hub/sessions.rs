//! Session issuance, name allocation, and authentication.

use super::Hub;
use crate::errors::{ServerError, ServerResult};
use crate::store::entities::{GameId, GameSnapshot, PlayerId, RoomId, Session, SessionId};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 16;

/// Display names nobody may claim.
pub const RESERVED_NAMES: [&str; 6] = ["admin", "test", "server", "system", "bot", "ai"];

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinServerOutcome {
    pub session_id: SessionId,
    pub player_id: PlayerId,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Authenticated caller identity, injected into request handlers.
#[derive(Clone, Debug)]
pub struct AuthedSession {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub display_name: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub player_id: PlayerId,
    pub display_name: String,
    pub current_room_id: Option<RoomId>,
    pub current_game_id: Option<GameId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameSnapshot>,
}

/// Trim and validate a display name against length and the reserved list.
pub fn validate_name(name: &str) -> ServerResult<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(ServerError::InvalidArg(format!(
            "name must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters"
        )));
    }
    if RESERVED_NAMES.contains(&trimmed.to_lowercase().as_str()) {
        return Err(ServerError::NameReserved);
    }
    Ok(trimmed.to_string())
}

/// Opaque session token: 128 bits of RNG, hex.
fn generate_session_id() -> SessionId {
    format!("{:032x}", rand::rng().random::<u128>())
}

impl Hub {
    /// Register a player: reserve the name and issue session + player ids.
    pub async fn join_server(&self, name: &str) -> ServerResult<JoinServerOutcome> {
        let display_name = validate_name(name)?;
        let session = Session {
            id: generate_session_id(),
            player_id: Uuid::new_v4(),
            display_name: display_name.clone(),
            created_at: Utc::now(),
            last_activity: Utc::now(),
            current_room_id: None,
            current_game_id: None,
        };
        let outcome = JoinServerOutcome {
            session_id: session.id.clone(),
            player_id: session.player_id,
        };

        let mut state = self.state().await;
        state.insert_session(session)?;
        drop(state);

        log::info!("player '{display_name}' joined as {}", outcome.player_id);
        Ok(outcome)
    }

    /// Validation-only name probe; never mutates.
    pub async fn check_name(&self, name: &str) -> NameAvailability {
        match validate_name(name) {
            Err(err) => NameAvailability {
                available: false,
                reason: Some(err.to_string()),
            },
            Ok(valid) => {
                let state = self.state().await;
                if state.name_available(&valid) {
                    NameAvailability {
                        available: true,
                        reason: None,
                    }
                } else {
                    NameAvailability {
                        available: false,
                        reason: Some(ServerError::NameTaken.to_string()),
                    }
                }
            }
        }
    }

    /// Destroy the session, leaving its room first when necessary.
    pub async fn leave_server(&self, session_id: &str) -> ServerResult<()> {
        let mut state = self.state().await;
        let session = state.session(session_id)?.clone();

        let mut events = Vec::new();
        if let Some(room_id) = session.current_room_id {
            events = super::rooms::remove_player_from_room(
                &mut state,
                room_id,
                session.player_id,
                crate::events::LeaveReason::Leave,
            );
        }
        state.remove_session(session_id);
        drop(state);

        self.deliver(events);
        log::info!("player '{}' left the server", session.display_name);
        Ok(())
    }

    /// Token lookup; refreshes `last_activity` on every hit.
    pub async fn authenticate(&self, session_id: &str) -> ServerResult<AuthedSession> {
        let mut state = self.state().await;
        let session = state.session_mut(session_id)?;
        session.last_activity = Utc::now();
        Ok(AuthedSession {
            session_id: session.id.clone(),
            player_id: session.player_id,
            display_name: session.display_name.clone(),
        })
    }

    /// Reconnection snapshot: where the session is, plus the full game
    /// state when it is in one.
    pub async fn session_status(&self, session_id: &str) -> ServerResult<SessionStatus> {
        let state = self.state().await;
        let session = state.session(session_id)?;
        let game_state = session
            .current_game_id
            .and_then(|game_id| state.game(game_id).ok())
            .map(|game| game.snapshot_for(session.player_id));
        Ok(SessionStatus {
            player_id: session.player_id,
            display_name: session.display_name.clone(),
            current_room_id: session.current_room_id,
            current_game_id: session.current_game_id,
            game_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubConfig;

    #[test]
    fn name_validation_rules() {
        assert_eq!(validate_name("  Alice  ").unwrap(), "Alice");
        assert!(matches!(
            validate_name("x"),
            Err(ServerError::InvalidArg(_))
        ));
        assert!(matches!(
            validate_name("this name is far too long"),
            Err(ServerError::InvalidArg(_))
        ));
        assert_eq!(validate_name("Admin"), Err(ServerError::NameReserved));
        assert_eq!(validate_name("  AI "), Err(ServerError::NameReserved));
    }

    #[tokio::test]
    async fn join_server_reserves_name() {
        let hub = Hub::new(HubConfig::default());
        let joined = hub.join_server("Alice").await.unwrap();
        assert_eq!(joined.session_id.len(), 32);

        let probe = hub.check_name("alice").await;
        assert!(!probe.available);
        assert_eq!(hub.join_server("ALICE").await, Err(ServerError::NameTaken));

        hub.leave_server(&joined.session_id).await.unwrap();
        assert!(hub.check_name("alice").await.available);
    }

    #[tokio::test]
    async fn authenticate_refreshes_activity_and_rejects_garbage() {
        let hub = Hub::new(HubConfig::default());
        let joined = hub.join_server("Bob").await.unwrap();

        let authed = hub.authenticate(&joined.session_id).await.unwrap();
        assert_eq!(authed.player_id, joined.player_id);
        assert_eq!(authed.display_name, "Bob");

        assert_eq!(
            hub.authenticate("not-a-token").await.unwrap_err(),
            ServerError::Unauthorized
        );
    }

    #[tokio::test]
    async fn session_status_outside_any_game() {
        let hub = Hub::new(HubConfig::default());
        let joined = hub.join_server("Carol").await.unwrap();
        let status = hub.session_status(&joined.session_id).await.unwrap();
        assert!(status.current_room_id.is_none());
        assert!(status.current_game_id.is_none());
        assert!(status.game_state.is_none());
    }
}
