//! Trusted-identity extractor for Axum handlers.
//!
//! Credential verification happens upstream; this service receives the
//! already-authenticated actor in request headers and trusts it as-is. No
//! tokens, passwords, or sessions are handled here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use agora_core::error::CoreError;
use agora_core::types::DbId;

use crate::error::AppError;

/// The acting user for a request, extracted from identity headers.
///
/// Use this as an extractor parameter in any handler that requires an actor:
///
/// ```ignore
/// async fn my_handler(actor: Actor) -> AppResult<Json<()>> {
///     tracing::info!(user_id = actor.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Actor {
    /// The user's internal database id (from `x-actor-id`).
    pub user_id: DbId,
    /// Whether the upstream identity service marked the actor as an admin
    /// (from `x-actor-admin`; absent means `false`).
    pub is_admin: bool,
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing x-actor-id header".into()))
            })?;

        let user_id: DbId = raw_id.parse().map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Malformed x-actor-id header".into()))
        })?;

        let is_admin = parts
            .headers
            .get("x-actor-admin")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "true")
            .unwrap_or(false);

        Ok(Actor { user_id, is_admin })
    }
}
