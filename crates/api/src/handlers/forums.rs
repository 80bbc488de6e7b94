//! Handlers for the forum directory: creation, listing, and lookup.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use agora_core::error::CoreError;
use agora_core::forums::{can_view_forum, validate_forum_name, validate_visibility};
use agora_core::types::DbId;
use agora_db::models::forum::CreateForum;
use agora_db::repositories::ForumRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::identity::Actor;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /forums
///
/// Create a new forum (admin only). A duplicate name surfaces as 409 via
/// the `uq_forums_name` constraint.
pub async fn create_forum(
    actor: Actor,
    State(state): State<AppState>,
    Json(input): Json<CreateForum>,
) -> AppResult<impl IntoResponse> {
    if !actor.is_admin {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only admins may create forums".into(),
        )));
    }
    validate_forum_name(&input.name).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    if let Some(ref visibility) = input.visibility {
        validate_visibility(visibility).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    let forum = ForumRepo::create(&state.pool, &input).await?;

    tracing::info!(
        user_id = actor.user_id,
        forum_id = forum.id,
        name = %forum.name,
        visibility = %forum.visibility,
        "Forum created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: forum })))
}

/// GET /forums
///
/// List forums. Closed forums are omitted for non-admin actors.
pub async fn list_forums(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let forums = ForumRepo::list(&state.pool).await?;
    let visible: Vec<_> = forums
        .into_iter()
        .filter(|f| can_view_forum(&f.visibility, actor.is_admin))
        .collect();

    Ok(Json(DataResponse { data: visible }))
}

/// GET /forums/{id}
///
/// Get a single forum by id, subject to the same visibility rule as its
/// threads.
pub async fn get_forum(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let forum = ForumRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Forum", id }))?;

    if !can_view_forum(&forum.visibility, actor.is_admin) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Forum is closed".into(),
        )));
    }

    Ok(Json(DataResponse { data: forum }))
}
