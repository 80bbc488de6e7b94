//! Message model.

use agora_core::thread::Threadable;
use agora_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `messages` table.
///
/// `parent_id` is `None` for a forum's root messages. Soft-deleted rows stay
/// in place with `is_deleted = true` and tombstoned content.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: DbId,
    pub forum_id: DbId,
    pub author_id: DbId,
    pub parent_id: Option<DbId>,
    pub content: String,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Threadable for Message {
    fn id(&self) -> DbId {
        self.id
    }
    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }
    fn created_at(&self) -> Timestamp {
        self.created_at
    }
    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// DTO for creating a new message or reply.
#[derive(Debug, Deserialize)]
pub struct CreateMessage {
    pub content: String,
    pub forum_id: DbId,
    pub parent_id: Option<DbId>,
}

/// DTO for editing a message's content.
#[derive(Debug, Deserialize)]
pub struct EditMessage {
    pub content: String,
}
