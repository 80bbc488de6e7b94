//! Room-scoped fan-out hub.
//!
//! One [`ForumHub`] instance owns all real-time state: the connection
//! registry, per-forum room membership, and the bounded dedupe cache. State
//! is only ever mutated through the hub's own methods, behind a single
//! `RwLock`, so the hub can be unit-tested without a network layer and no
//! other component can reach into it.

use std::collections::{HashMap, HashSet, VecDeque};

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use agora_core::types::{DbId, Timestamp};

use crate::ws::protocol::{MessagePayload, ServerEvent};

/// Capacity of the recent-keys dedupe cache. When full, the oldest key is
/// evicted FIFO.
pub const DEDUPE_CACHE_CAPACITY: usize = 100;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct HubConnection {
    /// Authenticated user id, when the connection presented identity headers.
    /// Used to exclude an author's own connections from server-origin
    /// broadcasts.
    pub user_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// All mutable hub state, guarded as one unit so membership checks and the
/// dedupe cache stay consistent under interleaved event handling.
#[derive(Default)]
struct HubState {
    connections: HashMap<String, HubConnection>,
    rooms: HashMap<DbId, HashSet<String>>,
    recent_keys: VecDeque<String>,
    recent_set: HashSet<String>,
}

impl HubState {
    /// Record a dedupe key. Returns `false` if the key was already in the
    /// cache (the publish must be dropped). Evicts the oldest key when full.
    fn note_key(&mut self, key: &str) -> bool {
        if self.recent_set.contains(key) {
            return false;
        }
        if self.recent_keys.len() >= DEDUPE_CACHE_CAPACITY {
            if let Some(oldest) = self.recent_keys.pop_front() {
                self.recent_set.remove(&oldest);
            }
        }
        self.recent_set.insert(key.to_string());
        self.recent_keys.push_back(key.to_string());
        true
    }

    /// Relay an event to every member of a forum's room except those the
    /// `exclude` predicate matches. Returns the number of connections the
    /// event was sent to. Closed channels are silently skipped (they are
    /// cleaned up when their receive loop exits).
    fn relay(
        &self,
        forum_id: DbId,
        event: &ServerEvent,
        exclude: impl Fn(&str, &HubConnection) -> bool,
    ) -> usize {
        let Some(members) = self.rooms.get(&forum_id) else {
            return 0;
        };
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound event");
                return 0;
            }
        };

        let mut relayed = 0;
        for conn_id in members {
            let Some(conn) = self.connections.get(conn_id) else {
                continue;
            };
            if exclude(conn_id, conn) {
                continue;
            }
            if conn.sender.send(Message::Text(text.clone().into())).is_ok() {
                relayed += 1;
            }
        }
        relayed
    }
}

/// Room-based publish/subscribe hub for forum messages.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Membership is connection-scoped and
/// ephemeral: nothing survives a disconnect, and reconnecting clients
/// re-fetch state over REST.
pub struct ForumHub {
    state: RwLock<HubState>,
}

impl ForumHub {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HubState::default()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = HubConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.state.write().await.connections.insert(conn_id, conn);
        rx
    }

    /// Remove a connection and clear all of its room memberships.
    pub async fn remove(&self, conn_id: &str) {
        let mut state = self.state.write().await;
        state.connections.remove(conn_id);
        state.rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
    }

    /// Subscribe a connection to a forum's room.
    ///
    /// Room ids arrive as strings on the wire; a malformed id is logged and
    /// ignored, never fatal to the connection.
    pub async fn join(&self, conn_id: &str, raw_forum_id: &str) {
        let Ok(forum_id) = raw_forum_id.parse::<DbId>() else {
            tracing::warn!(conn_id = %conn_id, raw = %raw_forum_id, "Ignoring join for malformed forum id");
            return;
        };
        let mut state = self.state.write().await;
        if !state.connections.contains_key(conn_id) {
            return;
        }
        state
            .rooms
            .entry(forum_id)
            .or_default()
            .insert(conn_id.to_string());
        tracing::debug!(conn_id = %conn_id, forum_id, "Joined forum room");
    }

    /// Unsubscribe a connection from a forum's room.
    pub async fn leave(&self, conn_id: &str, raw_forum_id: &str) {
        let Ok(forum_id) = raw_forum_id.parse::<DbId>() else {
            tracing::warn!(conn_id = %conn_id, raw = %raw_forum_id, "Ignoring leave for malformed forum id");
            return;
        };
        let mut state = self.state.write().await;
        if let Some(members) = state.rooms.get_mut(&forum_id) {
            members.remove(conn_id);
            if members.is_empty() {
                state.rooms.remove(&forum_id);
            }
        }
        tracing::debug!(conn_id = %conn_id, forum_id, "Left forum room");
    }

    /// Fan a client-announced message out to the other members of its
    /// forum's room.
    ///
    /// The dedupe key (authoritative id, or the client `tempId` fallback) is
    /// checked against the recent-keys cache first: a repeated key drops the
    /// publish entirely, giving at-most-once relay per message id within the
    /// cache window. The publishing connection is always excluded -- it
    /// already has the message from its own create call.
    ///
    /// Returns the number of connections the message was relayed to.
    pub async fn publish(&self, sender_conn: &str, payload: &MessagePayload) -> usize {
        let Some(key) = payload.dedupe_key() else {
            tracing::debug!(conn_id = %sender_conn, "Dropping publish without id or tempId");
            return 0;
        };

        let mut state = self.state.write().await;
        if !state.note_key(&key) {
            tracing::debug!(key = %key, "Duplicate publish suppressed");
            return 0;
        }
        state.relay(
            payload.forum_id,
            &ServerEvent::ReceiveMessage(payload.clone()),
            |conn_id, _| conn_id == sender_conn,
        )
    }

    /// Fan a server-origin message (e.g. a REST create) out to its forum's
    /// room.
    ///
    /// Shares the dedupe cache with [`publish`](Self::publish), so a client
    /// that both created a message over REST and announced it on its socket
    /// produces a single relay. Connections authenticated as the payload's
    /// author are excluded, mirroring the sender exclusion of socket-origin
    /// publishes.
    pub async fn broadcast_message(&self, payload: &MessagePayload) -> usize {
        let Some(key) = payload.dedupe_key() else {
            return 0;
        };

        let mut state = self.state.write().await;
        if !state.note_key(&key) {
            tracing::debug!(key = %key, "Duplicate broadcast suppressed");
            return 0;
        }
        let author_id = payload.author.id;
        state.relay(
            payload.forum_id,
            &ServerEvent::ReceiveMessage(payload.clone()),
            |_, conn| conn.user_id == Some(author_id),
        )
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Return the current number of members in a forum's room.
    pub async fn room_member_count(&self, forum_id: DbId) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(&forum_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let state = self.state.read().await;
        for conn in state.connections.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every connection, then clear all state.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut state = self.state.write().await;
        let count = state.connections.len();
        for conn in state.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        state.connections.clear();
        state.rooms.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for ForumHub {
    fn default() -> Self {
        Self::new()
    }
}
