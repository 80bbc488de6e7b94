//! Repository for the `forums` table.

use agora_core::forums::VISIBILITY_OPEN;
use agora_core::types::DbId;
use sqlx::PgPool;

use crate::models::forum::{CreateForum, Forum};

/// Column list for forums queries.
const COLUMNS: &str = "id, name, description, visibility, created_at";

/// Provides CRUD operations for forums.
pub struct ForumRepo;

impl ForumRepo {
    /// Create a new forum, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateForum) -> Result<Forum, sqlx::Error> {
        let visibility = input.visibility.as_deref().unwrap_or(VISIBILITY_OPEN);
        let query = format!(
            "INSERT INTO forums (name, description, visibility)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Forum>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(visibility)
            .fetch_one(pool)
            .await
    }

    /// Find a forum by its id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Forum>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forums WHERE id = $1");
        sqlx::query_as::<_, Forum>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all forums, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Forum>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forums ORDER BY created_at ASC, id ASC");
        sqlx::query_as::<_, Forum>(&query).fetch_all(pool).await
    }
}
