//! Duplex channel endpoint.
//!
//! Clients attach at `GET /ws?sessionId=<token>`. The server replies
//! `connected`, then pushes `{type, data, timestamp}` events as state
//! changes. The only inbound message recognized is `{type: "ping"}`,
//! answered with `pong` and counted as a liveness probe. Missing or
//! invalid tokens close the socket with 4001/4002.

use super::AppState;
use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use sequence_core::events::ServerEvent;
use serde::Deserialize;

/// Close code for a missing session token.
const CLOSE_MISSING_TOKEN: u16 = 4001;
/// Close code for an invalid or expired session token.
const CLOSE_INVALID_TOKEN: u16 = 4002;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query.session_id, state))
}

async fn handle_socket(mut socket: WebSocket, token: Option<String>, state: AppState) {
    let Some(token) = token else {
        close_with(&mut socket, CLOSE_MISSING_TOKEN, "missing session token").await;
        return;
    };
    let authed = match state.hub.authenticate(&token).await {
        Ok(authed) => authed,
        Err(_) => {
            close_with(&mut socket, CLOSE_INVALID_TOKEN, "invalid session token").await;
            return;
        }
    };
    let player_id = authed.player_id;

    // Attaching cancels any pending disconnect removal for this player
    // and replaces an older channel outright.
    let handle = state.hub.connections().attach(player_id);
    let epoch = handle.epoch;
    let mut outbox = handle.receiver;

    log::info!("channel attached for '{}' ({player_id})", authed.display_name);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            outgoing = outbox.recv() => {
                match outgoing {
                    Some(text) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Server side terminated the channel (heartbeat or a
                    // replacement attach); close the socket cleanly.
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if is_ping(&text) {
                            state.hub.connections().mark_alive(player_id);
                            state.hub.connections().send(player_id, &ServerEvent::Pong);
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        state.hub.connections().mark_alive(player_id);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        log::warn!("channel error for {player_id}: {err}");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.hub.channel_closed(player_id, epoch);
    log::info!("channel closed for {player_id}");
}

fn is_ping(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .is_ok_and(|value| value["type"] == "ping")
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_detection_is_strict() {
        assert!(is_ping(r#"{"type":"ping"}"#));
        assert!(is_ping(r#"{"type":"ping","timestamp":1}"#));
        assert!(!is_ping(r#"{"type":"pong"}"#));
        assert!(!is_ping("ping"));
        assert!(!is_ping("{"));
    }
}
