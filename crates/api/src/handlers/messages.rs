//! Handlers for messages: creation, root listings, thread views, edits,
//! single soft-delete, and cascade deletion of whole reply subtrees.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use agora_core::error::CoreError;
use agora_core::forums::can_view_forum;
use agora_core::messages::{can_modify_message, validate_message_content, ListOrder};
use agora_core::thread::{build_thread, DEFAULT_MAX_DEPTH};
use agora_core::types::DbId;
use agora_db::models::message::{CreateMessage, EditMessage, Message};
use agora_db::models::user::User;
use agora_db::repositories::{ForumRepo, MessageRepo, UserRepo};
use agora_events::{
    ForumEvent, EVENT_MESSAGE_CASCADE_DELETED, EVENT_MESSAGE_CREATED, EVENT_MESSAGE_DELETED,
    EVENT_MESSAGE_UPDATED,
};

use crate::error::{AppError, AppResult};
use crate::middleware::identity::Actor;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::protocol::MessagePayload;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for listing a forum's root messages.
#[derive(Debug, Deserialize)]
pub struct RootListParams {
    /// `asc` for chronological order; anything else means newest first.
    pub order: Option<String>,
}

/// Query parameters for the nested thread view.
#[derive(Debug, Deserialize)]
pub struct ThreadParams {
    /// Maximum reply depth to assemble (default 5).
    pub depth: Option<usize>,
}

/// Result of a cascade delete: how many rows were newly tombstoned, and
/// which descendants were in the collected subtree.
#[derive(Debug, Serialize)]
pub struct CascadeDeleteResult {
    pub deleted_count: u64,
    pub affected_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

/// Publish a full-payload message event on the bus.
///
/// Encoding a payload of plain ids and strings cannot realistically fail;
/// if it ever does, the event is dropped with an error log rather than
/// failing the request that already committed its mutation.
fn publish_message_event(
    state: &AppState,
    event_type: &str,
    actor_id: DbId,
    message: &Message,
    author: &User,
) {
    let payload = MessagePayload::from_parts(message, author);
    match serde_json::to_value(&payload) {
        Ok(value) => state.event_bus.publish(
            ForumEvent::new(event_type)
                .with_forum(message.forum_id)
                .with_actor(actor_id)
                .with_payload(value),
        ),
        Err(e) => tracing::error!(error = %e, "Failed to encode broadcast payload"),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /messages
///
/// Create a root message or a reply. The forum must exist, and a reply's
/// parent must be a message in that same forum.
pub async fn create_message(
    actor: Actor,
    State(state): State<AppState>,
    Json(input): Json<CreateMessage>,
) -> AppResult<impl IntoResponse> {
    validate_message_content(&input.content)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    ForumRepo::find_by_id(&state.pool, input.forum_id)
        .await?
        .ok_or_else(|| not_found("Forum", input.forum_id))?;

    if let Some(parent_id) = input.parent_id {
        let parent = MessageRepo::find_by_id(&state.pool, parent_id)
            .await?
            .ok_or_else(|| not_found("Message", parent_id))?;
        // A parent in another forum is as good as absent.
        if parent.forum_id != input.forum_id {
            return Err(not_found("Message", parent_id));
        }
    }

    let author = UserRepo::find_by_id(&state.pool, actor.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown actor id".into())))?;

    let message = MessageRepo::create(&state.pool, actor.user_id, &input).await?;

    publish_message_event(&state, EVENT_MESSAGE_CREATED, actor.user_id, &message, &author);

    tracing::info!(
        user_id = actor.user_id,
        message_id = message.id,
        forum_id = message.forum_id,
        parent_id = ?message.parent_id,
        "Message created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// GET /forums/{id}/messages?order=
///
/// List a forum's non-deleted root messages, newest first by default.
pub async fn list_forum_messages(
    actor: Actor,
    State(state): State<AppState>,
    Path(forum_id): Path<DbId>,
    Query(params): Query<RootListParams>,
) -> AppResult<impl IntoResponse> {
    let forum = ForumRepo::find_by_id(&state.pool, forum_id)
        .await?
        .ok_or_else(|| not_found("Forum", forum_id))?;

    if !can_view_forum(&forum.visibility, actor.is_admin) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Forum is closed".into(),
        )));
    }

    let order = ListOrder::from_param(params.order.as_deref());
    let roots = MessageRepo::list_roots(&state.pool, forum_id, order).await?;

    Ok(Json(DataResponse { data: roots }))
}

/// GET /messages/{id}
///
/// Get a single message by id. Tombstoned messages are returned too -- their
/// content is the fixed placeholder.
pub async fn get_message(
    _actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let message = MessageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Message", id))?;

    Ok(Json(DataResponse { data: message }))
}

/// GET /messages/{id}/thread?depth=
///
/// Assemble the nested reply tree below a message, at most `depth` levels
/// deep (default 5). Point-in-time snapshot; deleted replies are omitted.
pub async fn get_thread(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ThreadParams>,
) -> AppResult<impl IntoResponse> {
    let root = MessageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Message", id))?;

    let forum = ForumRepo::find_by_id(&state.pool, root.forum_id)
        .await?
        .ok_or_else(|| not_found("Forum", root.forum_id))?;
    if !can_view_forum(&forum.visibility, actor.is_admin) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Forum is closed".into(),
        )));
    }

    let depth = params.depth.unwrap_or(DEFAULT_MAX_DEPTH);
    let messages = MessageRepo::list_subtree(&state.pool, id, depth).await?;
    let thread = build_thread(id, &messages, depth);

    Ok(Json(DataResponse { data: thread }))
}

/// PUT /messages/{id}
///
/// Replace a message's content. Only the author or an admin may edit, and a
/// tombstoned message cannot be edited back to life.
pub async fn edit_message(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<EditMessage>,
) -> AppResult<impl IntoResponse> {
    validate_message_content(&input.content)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let message = MessageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Message", id))?;

    if !can_modify_message(actor.user_id, actor.is_admin, message.author_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author or an admin may edit a message".into(),
        )));
    }
    if message.is_deleted {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot edit a deleted message".into(),
        )));
    }

    let updated = MessageRepo::edit(&state.pool, id, &input.content)
        .await?
        .ok_or_else(|| not_found("Message", id))?;

    if let Some(author) = UserRepo::find_by_id(&state.pool, updated.author_id).await? {
        publish_message_event(&state, EVENT_MESSAGE_UPDATED, actor.user_id, &updated, &author);
    }

    tracing::info!(
        user_id = actor.user_id,
        message_id = id,
        "Message edited"
    );

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /messages/{id}
///
/// Soft-delete a single message: the row keeps its place in the tree and its
/// content becomes the tombstone placeholder. Replies are left untouched.
/// Idempotent -- deleting an already-deleted message succeeds as a no-op.
pub async fn delete_message(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let message = MessageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Message", id))?;

    if !can_modify_message(actor.user_id, actor.is_admin, message.author_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author or an admin may delete a message".into(),
        )));
    }

    let newly_deleted = MessageRepo::soft_delete(&state.pool, id).await?;

    if newly_deleted {
        state.event_bus.publish(
            ForumEvent::new(EVENT_MESSAGE_DELETED)
                .with_forum(message.forum_id)
                .with_actor(actor.user_id)
                .with_payload(serde_json::json!({ "id": id, "forumId": message.forum_id })),
        );
    }

    tracing::info!(
        user_id = actor.user_id,
        message_id = id,
        newly_deleted,
        "Message soft-deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /messages/{id}/tree
///
/// Soft-delete a message and every descendant in its reply subtree as one
/// logical operation. The traversal is exhaustive (no depth cutoff) and the
/// tombstoning is a single bulk update over the collected id set; a failure
/// partway through is reported as a partial mutation count, not rolled back.
pub async fn cascade_delete_message(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let message = MessageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Message", id))?;

    if !can_modify_message(actor.user_id, actor.is_admin, message.author_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author or an admin may delete a message".into(),
        )));
    }

    let affected_ids = MessageRepo::collect_descendant_ids(&state.pool, id).await?;
    let mut targets = affected_ids.clone();
    targets.push(id);

    let deleted_count = MessageRepo::soft_delete_many(&state.pool, &targets).await?;

    state.event_bus.publish(
        ForumEvent::new(EVENT_MESSAGE_CASCADE_DELETED)
            .with_forum(message.forum_id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({
                "id": id,
                "forumId": message.forum_id,
                "affectedIds": affected_ids,
            })),
    );

    tracing::info!(
        user_id = actor.user_id,
        message_id = id,
        deleted_count,
        descendant_count = affected_ids.len(),
        "Cascade delete applied"
    );

    Ok(Json(DataResponse {
        data: CascadeDeleteResult {
            deleted_count,
            affected_ids,
        },
    }))
}
