//! Wire protocol for the real-time layer.
//!
//! Event names and payload field casing are a compatibility contract and
//! must not drift: clients dispatch on `join_forum`, `leave_forum`,
//! `new_message`, and `receive_message`, with camelCase payload fields.

use agora_core::types::{DbId, Timestamp};
use agora_db::models::message::Message;
use agora_db::models::user::User;
use serde::{Deserialize, Serialize};

/// Author block embedded in every relayed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPayload {
    pub id: DbId,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Message payload carried by `new_message` and `receive_message`.
///
/// `id` is the authoritative store id. A client announcing a message before
/// it has seen the persisted row may carry only `tempId`, which then serves
/// as the dedupe-key fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    pub content: String,
    pub created_at: Option<Timestamp>,
    pub forum_id: DbId,
    pub parent_id: Option<DbId>,
    pub author: AuthorPayload,
}

impl MessagePayload {
    /// Build the broadcast payload for a persisted message.
    pub fn from_parts(message: &Message, author: &User) -> Self {
        Self {
            id: Some(message.id),
            temp_id: None,
            content: message.content.clone(),
            created_at: Some(message.created_at),
            forum_id: message.forum_id,
            parent_id: message.parent_id,
            author: AuthorPayload {
                id: author.id,
                username: author.username.clone(),
                avatar_url: author.avatar_url.clone(),
            },
        }
    }

    /// Key used to suppress duplicate fan-out of the same logical message:
    /// the authoritative id when known, otherwise the client's `tempId`.
    pub fn dedupe_key(&self) -> Option<String> {
        self.id
            .map(|id| id.to_string())
            .or_else(|| self.temp_id.clone())
    }
}

/// Events a client sends to the hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Subscribe the connection to a forum's room. Payload: forum id string.
    JoinForum(String),
    /// Unsubscribe the connection from a forum's room. Payload: forum id string.
    LeaveForum(String),
    /// Announce a just-created message for fan-out to the forum's room.
    NewMessage(MessagePayload),
}

/// Events the hub sends to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message created elsewhere in a room this connection has joined.
    ReceiveMessage(MessagePayload),
}
