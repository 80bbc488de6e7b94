//! User model.
//!
//! Identity is supplied by an upstream service; this table only carries the
//! directory data needed for authorship and broadcast payloads.

use agora_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: Timestamp,
}

/// DTO for provisioning a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub avatar_url: Option<String>,
    pub is_admin: Option<bool>,
}
