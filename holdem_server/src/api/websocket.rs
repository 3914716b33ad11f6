//! WebSocket handler for game commands and live state updates.
//!
//! A single endpoint carries the whole game protocol. Once connected,
//! every client is an observer: after each successfully processed action
//! an `update` message with the full hand snapshot is broadcast to all
//! connections. Command outcomes (`hand_started`, `ack`, `error`, ...)
//! go to the sending connection only.
//!
//! # Client Messages
//!
//! ```json
//! { "type": "start_hand", "blind_interval_secs": 600, "small_blind": 10 }
//! { "type": "action", "game_id": "...", "hand_id": "...",
//!   "participant_id": "...", "kind": "raise", "amount": 50 }
//! { "type": "close_game", "game_id": "..." }
//! { "type": "ping" }
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use holdem_core::game::entities::{ActionKind, Game, Hand, Participant};
use holdem_core::game::errors::EngineError;

use super::AppState;

/// Client messages received via WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Create a game with the configured seats and deal its first hand.
    StartHand {
        blind_interval_secs: Option<i64>,
        small_blind: Option<i64>,
    },
    /// Take a betting action in a running hand.
    Action {
        game_id: Option<Uuid>,
        hand_id: Option<Uuid>,
        participant_id: Option<Uuid>,
        kind: Option<ActionKind>,
        amount: Option<i64>,
    },
    /// End a game and stop its actor.
    CloseGame { game_id: Option<Uuid> },
    /// Liveness probe.
    Ping,
}

/// Messages sent to clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    HandStarted {
        game: Game,
        hand: Hand,
        participants: Vec<Participant>,
        level: i32,
        blind_interval_secs: i64,
    },
    Ack,
    Update {
        game_id: Uuid,
        hand: Hand,
        participants: Vec<Participant>,
    },
    GameClosed {
        game_id: Uuid,
    },
    Pong,
    Error {
        message: String,
    },
}

/// Upgrade the HTTP connection to a WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Spawns a send task that multiplexes broadcast updates and command
/// responses onto the socket, then processes incoming client messages
/// until the connection closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected");

    let mut updates = state.manager.subscribe();
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    match update {
                        Ok(update) => {
                            let message = ServerMessage::Update {
                                game_id: update.game_id,
                                hand: update.hand,
                                participants: update.participants,
                            };
                            let json = match serde_json::to_string(&message) {
                                Ok(json) => json,
                                Err(e) => {
                                    error!("Failed to serialize update: {e}");
                                    continue;
                                }
                            };
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Observer lagged, skipped {skipped} updates");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                response = response_rx.recv() => {
                    let Some(json) = response else { break };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => handle_client_message(client_msg, &state).await,
                    Err(e) => ServerMessage::Error {
                        message: format!("Invalid message: {e}"),
                    },
                };
                match serde_json::to_string(&response) {
                    Ok(json) => {
                        if response_tx.send(json).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize response: {e}"),
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Axum answers pings at the protocol level.
            Ok(_) => {}
        }
    }

    send_task.abort();
    info!("WebSocket disconnected");
}

async fn handle_client_message(message: ClientMessage, state: &AppState) -> ServerMessage {
    match message {
        ClientMessage::StartHand {
            blind_interval_secs,
            small_blind,
        } => {
            let blind_interval_secs =
                blind_interval_secs.unwrap_or(state.defaults.blind_interval_secs);
            let small_blind = small_blind.unwrap_or(state.defaults.small_blind);
            if blind_interval_secs <= 0 || small_blind <= 0 {
                return ServerMessage::Error {
                    message: "blind_interval_secs and small_blind must be positive".to_string(),
                };
            }

            match state.manager.start_game(blind_interval_secs, small_blind).await {
                Ok((game, snapshot)) => ServerMessage::HandStarted {
                    level: game.level,
                    blind_interval_secs: game.blind_interval_secs,
                    game,
                    hand: snapshot.hand,
                    participants: snapshot.participants,
                },
                Err(err) => engine_error_response(&err),
            }
        }

        ClientMessage::Action {
            game_id,
            hand_id,
            participant_id,
            kind,
            amount,
        } => {
            let Some(game_id) = game_id else {
                return validation_error("game_id");
            };
            let Some(hand_id) = hand_id else {
                return validation_error("hand_id");
            };
            let Some(participant_id) = participant_id else {
                return validation_error("participant_id");
            };
            let Some(kind) = kind else {
                return validation_error("kind");
            };

            match state
                .manager
                .submit_action(game_id, hand_id, participant_id, kind, amount)
                .await
            {
                Ok(_snapshot) => ServerMessage::Ack,
                Err(err) => engine_error_response(&err),
            }
        }

        ClientMessage::CloseGame { game_id } => {
            let Some(game_id) = game_id else {
                return validation_error("game_id");
            };
            match state.manager.close_game(game_id).await {
                Ok(()) => ServerMessage::GameClosed { game_id },
                Err(err) => engine_error_response(&err),
            }
        }

        ClientMessage::Ping => ServerMessage::Pong,
    }
}

fn validation_error(field: &str) -> ServerMessage {
    ServerMessage::Error {
        message: format!("Missing required field: {field}"),
    }
}

/// Rule violations are returned verbatim; infrastructure failures are
/// logged with context and surfaced as an opaque message.
fn engine_error_response(err: &EngineError) -> ServerMessage {
    if err.is_rule_violation() {
        ServerMessage::Error {
            message: err.to_string(),
        }
    } else {
        error!("Engine failure: {err}");
        ServerMessage::Error {
            message: "Internal server error".to_string(),
        }
    }
}
