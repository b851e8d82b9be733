use std::sync::Arc;
use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, error, warn};

use crate::models::ReceivedMessage;
use crate::state::AppState;
use crate::websocket::msg_editing_handler::handle_editing_message;
use crate::websocket::msg_open_handler::handle_open_message;
use crate::websocket::msg_update_handler::handle_update_message;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Drive one connection: apply client events to its session and forward what
/// peers relay into the session's room.
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let mut session = app_state.coordinator.connect().await;
    let session_id = session.id();

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary and ping/pong frames carry no events
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Connection error for session {}: {}", session_id, e);
                        break;
                    }
                };

                // Parse the incoming message as JSON
                let json_msg: ReceivedMessage = match serde_json::from_str(&text) {
                    Ok(json_msg) => json_msg,
                    Err(e) => {
                        error!("Failed to parse message from session {}: {}", session_id, e);
                        continue;
                    }
                };

                // Handle different message types
                match json_msg {
                    ReceivedMessage::NoteOpen(note_id) => {
                        handle_open_message(note_id, &mut session).await;
                    }
                    ReceivedMessage::NoteUpdate(content) => {
                        handle_update_message(content, &session).await;
                    }
                    ReceivedMessage::Editing(feedback) => {
                        handle_editing_message(feedback, &session).await;
                    }
                }
            }
            relayed = session.recv() => {
                let Some(msg) = relayed else { break };
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to serialize message for session {}: {}", session_id, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    }

    session.disconnect().await;
    info!("WebSocket connection terminated for session {}", session_id);
}
