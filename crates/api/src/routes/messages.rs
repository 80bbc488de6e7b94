//! Route definitions for messages.
//!
//! Mounted at `/messages` by `api_routes()`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Message routes.
///
/// ```text
/// POST   /                 -> create_message
/// GET    /{id}             -> get_message
/// PUT    /{id}             -> edit_message
/// DELETE /{id}             -> delete_message (single node, no cascade)
/// GET    /{id}/thread      -> get_thread (?depth, default 5)
/// DELETE /{id}/tree        -> cascade_delete_message (whole subtree)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(messages::create_message))
        .route(
            "/{id}",
            get(messages::get_message)
                .put(messages::edit_message)
                .delete(messages::delete_message),
        )
        .route("/{id}/thread", get(messages::get_thread))
        .route("/{id}/tree", delete(messages::cascade_delete_message))
}
