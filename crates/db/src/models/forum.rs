//! Forum model.

use agora_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `forums` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Forum {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// `"open"` or `"closed"`; closed forums are readable by admins only.
    pub visibility: String,
    pub created_at: Timestamp,
}

/// DTO for creating a new forum.
#[derive(Debug, Deserialize)]
pub struct CreateForum {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Option<String>,
}
