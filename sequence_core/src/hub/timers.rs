//! Scheduled tasks: AI delay, rematch deadline, disconnect grace,
//! heartbeat, and the periodic GC sweep.
//!
//! Every timer re-acquires the registry lock when it fires and
//! re-validates the world before acting; reattaches, finished games, and
//! already-resolved rematches all turn stale timers into no-ops.

use super::Hub;
use super::games::{AiTurnRef, teardown_finished_game};
use super::rooms::remove_player_from_room;
use crate::events::{LeaveReason, RematchCancelReason};
use crate::store::entities::{GameId, PlayerId};
use chrono::Utc;
use rand::Rng;
use std::time::Duration;

impl Hub {
    /// Launch the heartbeat and GC loops. Called once at process start.
    pub fn spawn_background(&self) {
        let Some(hub) = self.handle() else {
            return;
        };

        let heartbeat_hub = hub.clone();
        tokio::spawn(async move {
            let period = Duration::from_secs(heartbeat_hub.config().heartbeat_secs);
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                heartbeat_hub.heartbeat_sweep();
            }
        });

        tokio::spawn(async move {
            let period = Duration::from_secs(hub.config().gc_interval_secs);
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                hub.gc_sweep().await;
            }
        });
    }

    /// Arm an AI move with the configured human-feeling latency.
    pub(crate) fn schedule_ai_turn(&self, turn: AiTurnRef) {
        let Some(hub) = self.handle() else {
            return;
        };
        let (lo, hi) = self.config().ai_delay_ms;
        let delay = Duration::from_millis(rand::rng().random_range(lo..=hi));
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            hub.run_ai_turn(turn).await;
        });
    }

    /// Arm the rematch voting deadline for a finished game.
    pub(crate) fn schedule_rematch_deadline(&self, game_id: GameId) {
        let Some(hub) = self.handle() else {
            return;
        };
        let window = Duration::from_secs(self.config().rematch_window_secs);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            hub.rematch_deadline_expired(game_id).await;
        });
    }

    /// Deadline hit: tear the vote down unless it already resolved.
    pub(crate) async fn rematch_deadline_expired(&self, game_id: GameId) {
        let mut state = self.state().await;
        match state.rematch(game_id) {
            None => return,
            Some(rematch) if rematch.is_approved() => return,
            Some(rematch) if Utc::now() < rematch.deadline => return,
            Some(_) => {}
        }
        let events = teardown_finished_game(&mut state, game_id, RematchCancelReason::Timeout);
        drop(state);
        self.deliver(events);
    }

    /// The transport reports a closed socket. Only the channel generation
    /// that actually closed starts the grace countdown; a reattach has
    /// already replaced it and wins.
    pub fn channel_closed(&self, player_id: PlayerId, epoch: u64) {
        if !self.connections().detach(player_id, epoch) {
            return;
        }
        log::debug!("channel for {player_id} closed, grace timer armed");
        self.spawn_disconnect_grace(player_id);
    }

    pub(crate) fn spawn_disconnect_grace(&self, player_id: PlayerId) {
        let Some(hub) = self.handle() else {
            return;
        };
        let grace = Duration::from_secs(self.config().disconnect_grace_secs);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            hub.disconnect_grace_expired(player_id).await;
        });
    }

    /// Grace window over without a reattach: drop the player from their
    /// room, and drop the whole session when no game holds it. Games are
    /// deliberately left alone; the inactive-game sweep reclaims them.
    pub(crate) async fn disconnect_grace_expired(&self, player_id: PlayerId) {
        if self.connections().is_connected(player_id) {
            return;
        }
        let mut state = self.state().await;
        let Some(session) = state.session_by_player(player_id).cloned() else {
            return;
        };

        let mut events = Vec::new();
        if let Some(room_id) = session.current_room_id {
            events = remove_player_from_room(&mut state, room_id, player_id, LeaveReason::Disconnect);
            log::info!(
                "player '{}' removed from room {room_id} after disconnect",
                session.display_name
            );
        }
        if session.current_game_id.is_none() {
            state.remove_session(&session.id);
            log::info!("session for '{}' dropped after disconnect", session.display_name);
        }
        drop(state);
        self.deliver(events);
    }

    /// Heartbeat tick: channels that stayed silent for a full period are
    /// terminated and treated like any other disconnect.
    pub(crate) fn heartbeat_sweep(&self) {
        for player_id in self.connections().sweep_stale() {
            log::info!("channel for {player_id} failed liveness probe, terminating");
            self.spawn_disconnect_grace(player_id);
        }
    }

    /// Once-a-minute maintenance: idle sessions, empty rooms, inactive
    /// games whose humans are gone, and expired rematch votes.
    pub(crate) async fn gc_sweep(&self) {
        let now = Utc::now();
        let mut state = self.state().await;
        let mut events = Vec::new();

        let cutoff = now - chrono::Duration::seconds(self.config().session_ttl_secs as i64);
        for session_id in state.idle_sessions(cutoff) {
            let Some(session) = state.session(&session_id).ok().cloned() else {
                continue;
            };
            if let Some(room_id) = session.current_room_id {
                events.extend(remove_player_from_room(
                    &mut state,
                    room_id,
                    session.player_id,
                    LeaveReason::Disconnect,
                ));
            }
            state.remove_session(&session_id);
            log::info!("session for '{}' collected after 24h idle", session.display_name);
        }

        for room_id in state.empty_rooms() {
            state.remove_room(room_id);
            log::info!("empty room {room_id} collected");
        }

        let cutoff = now - chrono::Duration::seconds(self.config().game_inactivity_secs as i64);
        for game_id in state.idle_games(cutoff) {
            let Ok(game) = state.game(game_id) else {
                continue;
            };
            if game
                .humans()
                .any(|p| self.connections().is_connected(p.player_id))
            {
                continue;
            }
            let Some(game) = state.remove_game(game_id) else {
                continue;
            };
            state.remove_rematch(game_id);

            let human_ids: Vec<PlayerId> = game.humans().map(|p| p.player_id).collect();
            for player_id in human_ids {
                if let Some(session) = state.session_by_player_mut(player_id)
                    && session.current_game_id == Some(game_id)
                {
                    session.current_game_id = None;
                }
            }

            let mut drop_room = false;
            if let Ok(room) = state.room_mut(game.room_id) {
                if room.game_id == Some(game_id) {
                    room.players.retain(|p| !p.is_ai);
                    if room.human_count() == 0 {
                        drop_room = true;
                    } else {
                        room.status = crate::store::entities::RoomStatus::Waiting;
                        room.game_id = None;
                    }
                }
            }
            if drop_room {
                state.remove_room(game.room_id);
            }
            log::info!("inactive game {game_id} collected");
        }

        for game_id in state.expired_rematches(now) {
            events.extend(teardown_finished_game(
                &mut state,
                game_id,
                RematchCancelReason::Timeout,
            ));
        }

        drop(state);
        self.deliver(events);
    }
}
