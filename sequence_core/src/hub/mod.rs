//! The coordination hub: sessions, rooms, games, rematch voting, and the
//! scheduled tasks that drive them.
//!
//! All mutable state lives in one [`Registry`] behind a single coarse
//! lock; the connection map carries its own lock and never blocks. Every
//! handler follows the same discipline: acquire the registry lock, mutate,
//! collect the outbound events, release the lock, then deliver. Timers
//! (AI delay, rematch deadline, disconnect grace, heartbeat, GC) re-take
//! the lock when they fire and re-validate before touching anything, so a
//! stale timer is always a no-op.

pub mod games;
pub mod rooms;
pub mod sessions;
pub mod timers;

use crate::events::ServerEvent;
use crate::fanout::ConnectionManager;
use crate::store::entities::{Game, PlayerId, Room};
use crate::store::registry::Registry;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

/// Tunables for the hub's lifecycles and timers.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Name reported by the ping endpoint
    pub server_name: String,
    /// Idle sessions older than this are collected
    pub session_ttl_secs: u64,
    /// Inactive games older than this are collected once their humans
    /// are all disconnected
    pub game_inactivity_secs: u64,
    /// Reconnect window before a dropped channel removes the player from
    /// their room
    pub disconnect_grace_secs: u64,
    /// Rematch voting window
    pub rematch_window_secs: u64,
    /// Liveness probe cadence for duplex channels
    pub heartbeat_secs: u64,
    /// Background maintenance cadence
    pub gc_interval_secs: u64,
    /// AI move latency bounds, drawn uniformly per turn
    pub ai_delay_ms: (u64, u64),
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            server_name: "sequence-server".to_string(),
            session_ttl_secs: 24 * 60 * 60,
            game_inactivity_secs: 360,
            disconnect_grace_secs: 10,
            rematch_window_secs: 30,
            heartbeat_secs: 30,
            gc_interval_secs: 60,
            ai_delay_ms: (800, 1200),
        }
    }
}

/// Events addressed to individual players, collected under the registry
/// lock and delivered after it is released.
pub(crate) type EventBatch = Vec<(PlayerId, ServerEvent)>;

/// Counts surfaced by the health endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub sessions: usize,
    pub rooms: usize,
    pub games: usize,
    pub connections: usize,
}

pub struct Hub {
    state: Mutex<Registry>,
    connections: ConnectionManager,
    config: HubConfig,
    /// Self-handle for the tasks the hub spawns against itself.
    self_ref: Weak<Hub>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            state: Mutex::new(Registry::new()),
            connections: ConnectionManager::new(),
            config,
            self_ref: weak.clone(),
        })
    }

    /// Owning handle for spawned timers; `None` only during teardown.
    pub(crate) fn handle(&self) -> Option<Arc<Hub>> {
        self.self_ref.upgrade()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub(crate) async fn state(&self) -> tokio::sync::MutexGuard<'_, Registry> {
        self.state.lock().await
    }

    /// Serialize-and-send, strictly after the registry lock is gone.
    pub(crate) fn deliver(&self, batch: EventBatch) {
        self.connections.deliver(batch);
    }

    pub async fn stats(&self) -> HubStats {
        let state = self.state().await;
        HubStats {
            sessions: state.session_count(),
            rooms: state.room_count(),
            games: state.game_count(),
            connections: self.connections.connection_count(),
        }
    }
}

/// Address an event to every human in the room.
pub(crate) fn room_broadcast(room: &Room, event: &ServerEvent) -> EventBatch {
    room.humans()
        .map(|p| (p.player_id, event.clone()))
        .collect()
}

/// Address an event to every human in the game.
pub(crate) fn game_broadcast(game: &Game, event: &ServerEvent) -> EventBatch {
    game.humans()
        .map(|p| (p.player_id, event.clone()))
        .collect()
}
