//! Duplex-channel fan-out.
//!
//! At most one live channel per player. The manager hands the transport a
//! receiver to drain into its socket, so every socket has exactly one
//! writer and per-recipient ordering follows from the queue. Sends go
//! through an unbounded queue and never block, but state mutation and
//! delivery are still kept apart: handlers collect events under the
//! registry lock and push them here after releasing it.

use crate::events::ServerEvent;
use crate::store::entities::PlayerId;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// What the transport gets back from [`ConnectionManager::attach`].
pub struct ChannelHandle {
    /// Serialized outbound messages for this socket.
    pub receiver: mpsc::UnboundedReceiver<String>,
    /// Attach generation; a reattach invalidates older epochs.
    pub epoch: u64,
}

struct Connection {
    tx: mpsc::UnboundedSender<String>,
    epoch: u64,
    /// Cleared by the heartbeat sweep, set again by any inbound ping.
    alive: bool,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<PlayerId, Connection>,
    epochs: HashMap<PlayerId, u64>,
}

#[derive(Default)]
pub struct ConnectionManager {
    inner: Mutex<Inner>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh channel for the player, replacing any existing
    /// one (its receiver closes, ending the old socket task). Emits
    /// `connected` as the first message on the new channel.
    pub fn attach(&self, player_id: PlayerId) -> ChannelHandle {
        let (tx, receiver) = mpsc::unbounded_channel();
        let _ = tx.send(ServerEvent::Connected { player_id }.to_message());

        let mut inner = self.lock();
        let epoch = inner.epochs.entry(player_id).or_insert(0);
        *epoch += 1;
        let epoch = *epoch;
        inner.connections.insert(
            player_id,
            Connection {
                tx,
                epoch,
                alive: true,
            },
        );
        ChannelHandle { receiver, epoch }
    }

    /// Drop the channel if `epoch` is still the live one. Returns whether
    /// a channel was actually removed; `false` means a newer channel has
    /// replaced it and no disconnect handling should run.
    pub fn detach(&self, player_id: PlayerId, epoch: u64) -> bool {
        let mut inner = self.lock();
        match inner.connections.get(&player_id) {
            Some(conn) if conn.epoch == epoch => {
                inner.connections.remove(&player_id);
                true
            }
            _ => false,
        }
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.lock().connections.contains_key(&player_id)
    }

    /// Push an event to one player. Missing or closed channels are a
    /// silent no-op.
    pub fn send(&self, player_id: PlayerId, event: &ServerEvent) {
        let message = event.to_message();
        if let Some(conn) = self.lock().connections.get(&player_id) {
            let _ = conn.tx.send(message);
        }
    }

    /// Deliver a batch collected under the registry lock.
    pub fn deliver(&self, batch: Vec<(PlayerId, ServerEvent)>) {
        for (player_id, event) in batch {
            self.send(player_id, &event);
        }
    }

    /// Record liveness for the heartbeat sweep.
    pub fn mark_alive(&self, player_id: PlayerId) {
        if let Some(conn) = self.lock().connections.get_mut(&player_id) {
            conn.alive = true;
        }
    }

    /// Heartbeat tick: terminate channels that stayed silent since the
    /// previous tick and arm the rest for the next one. Returns the
    /// players whose channels were dropped.
    pub fn sweep_stale(&self) -> Vec<PlayerId> {
        let mut inner = self.lock();
        let stale: Vec<PlayerId> = inner
            .connections
            .iter()
            .filter(|(_, conn)| !conn.alive)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            inner.connections.remove(id);
        }
        for conn in inner.connections.values_mut() {
            conn.alive = false;
        }
        stale
    }

    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // The map lock is never held across await points; poisoning can
        // only follow a panic that is already fatal to the process.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
