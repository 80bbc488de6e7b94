//! Repository for the `messages` table.
//!
//! The reply structure is a forest kept flat in storage: roots have
//! `parent_id IS NULL`, replies point at an earlier message in the same
//! forum. Reads that feed the thread view filter out tombstoned rows; the
//! cascade traversal does not, so a deleted node's subtree is still
//! discovered exhaustively.

use std::collections::HashSet;

use agora_core::messages::{ListOrder, TOMBSTONE_CONTENT};
use agora_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::{CreateMessage, Message};

/// Column list for messages queries.
const COLUMNS: &str = "id, forum_id, author_id, parent_id, content, is_edited, is_deleted, \
    deleted_at, created_at, updated_at";

/// Provides CRUD and tree operations for messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a new message, returning the created row.
    ///
    /// Referential checks (forum exists, parent is in the same forum) are the
    /// caller's responsibility; the schema's foreign keys are the backstop.
    pub async fn create(
        pool: &PgPool,
        author_id: DbId,
        input: &CreateMessage,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (forum_id, author_id, parent_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.forum_id)
            .bind(author_id)
            .bind(input.parent_id)
            .bind(&input.content)
            .fetch_one(pool)
            .await
    }

    /// Find a message by its id.
    ///
    /// Tombstoned rows are returned too: a deleted message keeps its place in
    /// the tree and stays fetchable.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a forum's non-deleted root messages.
    pub async fn list_roots(
        pool: &PgPool,
        forum_id: DbId,
        order: ListOrder,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let direction = match order {
            ListOrder::Newest => "DESC",
            ListOrder::Oldest => "ASC",
        };
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE forum_id = $1 AND parent_id IS NULL AND is_deleted = FALSE
             ORDER BY created_at {direction}, id {direction}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(forum_id)
            .fetch_all(pool)
            .await
    }

    /// List the visible (non-deleted) direct replies of a set of messages,
    /// ordered by creation time ascending.
    pub async fn list_children_of_many(
        pool: &PgPool,
        parent_ids: &[DbId],
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE parent_id = ANY($1) AND is_deleted = FALSE
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(parent_ids)
            .fetch_all(pool)
            .await
    }

    /// Fetch the visible reply subtree below `root_id`, at most `max_depth`
    /// levels deep.
    ///
    /// One query per level; the loop stops early when a level comes back
    /// empty. The returned batch is flat -- `agora_core::thread::build_thread`
    /// turns it into the nested view.
    pub async fn list_subtree(
        pool: &PgPool,
        root_id: DbId,
        max_depth: usize,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let mut all = Vec::new();
        let mut frontier = vec![root_id];

        for _ in 0..max_depth {
            let level = Self::list_children_of_many(pool, &frontier).await?;
            if level.is_empty() {
                break;
            }
            frontier = level.iter().map(|m| m.id).collect();
            all.extend(level);
        }

        Ok(all)
    }

    /// Collect the ids of every descendant of `root_id`, however deep.
    ///
    /// Breadth-first worklist with one query per discovered frontier batch,
    /// run sequentially so the frontier stays consistent. Unlike the thread
    /// view there is no depth cutoff and no deleted filter: deletion must be
    /// exhaustive or it would strand undeleted replies below a tombstone.
    /// The `seen` guard keeps corrupt data (a manual cycle) from looping.
    pub async fn collect_descendant_ids(
        pool: &PgPool,
        root_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut descendants = Vec::new();
        let mut seen: HashSet<DbId> = HashSet::from([root_id]);
        let mut frontier = vec![root_id];

        while !frontier.is_empty() {
            let children: Vec<DbId> =
                sqlx::query_scalar("SELECT id FROM messages WHERE parent_id = ANY($1)")
                    .bind(&frontier)
                    .fetch_all(pool)
                    .await?;

            frontier = children
                .into_iter()
                .filter(|id| seen.insert(*id))
                .collect();
            descendants.extend(&frontier);
        }

        tracing::debug!(
            root_id,
            count = descendants.len(),
            "Collected descendant ids"
        );
        Ok(descendants)
    }

    /// Replace a message's content, marking it edited.
    pub async fn edit(
        pool: &PgPool,
        id: DbId,
        new_content: &str,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "UPDATE messages SET content = $2, is_edited = TRUE, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .bind(new_content)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a single message: mark it deleted and tombstone its
    /// content in place.
    ///
    /// Returns `true` if the row was newly tombstoned. Deleting an
    /// already-deleted message returns `false` and leaves `deleted_at` and
    /// content untouched, making the operation idempotent.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages
             SET is_deleted = TRUE, deleted_at = now(), content = $2, updated_at = now()
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(TOMBSTONE_CONTENT)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a set of messages in one bulk statement.
    ///
    /// Rows already deleted are skipped so their original `deleted_at` is
    /// preserved. Returns the number of rows newly tombstoned.
    pub async fn soft_delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages
             SET is_deleted = TRUE, deleted_at = now(), content = $2, updated_at = now()
             WHERE id = ANY($1) AND is_deleted = FALSE",
        )
        .bind(ids)
        .bind(TOMBSTONE_CONTENT)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
