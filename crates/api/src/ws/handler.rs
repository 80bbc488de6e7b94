use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use agora_core::types::DbId;

use crate::error::AppError;
use crate::middleware::identity::Actor;
use crate::state::AppState;
use crate::ws::hub::ForumHub;
use crate::ws::protocol::ClientEvent;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Identity headers are optional on the socket: an anonymous connection can
/// still join rooms and receive relays, it just cannot be matched as an
/// author for server-origin broadcast exclusion.
pub async fn ws_handler(
    actor: Result<Actor, AppError>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let user_id = actor.ok().map(|a| a.user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub, user_id))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with the hub.
///   2. Spawns a sender task that forwards messages from the hub channel.
///   3. Dispatches inbound room and publish events on the current task.
///   4. Cleans up on disconnect -- membership is ephemeral, so the hub
///      forgets the connection entirely.
async fn handle_socket(socket: WebSocket, hub: Arc<ForumHub>, user_id: Option<DbId>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = ?user_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = hub.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: dispatch inbound events.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => dispatch_event(&hub, &conn_id, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    hub.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Parse and dispatch one inbound text frame.
///
/// Unrecognized or malformed frames are logged and dropped; a bad frame
/// never tears down the connection.
async fn dispatch_event(hub: &ForumHub, conn_id: &str, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::JoinForum(forum_id)) => hub.join(conn_id, &forum_id).await,
        Ok(ClientEvent::LeaveForum(forum_id)) => hub.leave(conn_id, &forum_id).await,
        Ok(ClientEvent::NewMessage(payload)) => {
            let relayed = hub.publish(conn_id, &payload).await;
            tracing::debug!(
                conn_id = %conn_id,
                forum_id = payload.forum_id,
                relayed,
                "Client publish processed"
            );
        }
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Unrecognized WebSocket event");
        }
    }
}
