//! Route definitions for the forum directory.
//!
//! Mounted at `/forums` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{forums, messages};
use crate::state::AppState;

/// Forum routes.
///
/// ```text
/// GET    /                 -> list_forums
/// POST   /                 -> create_forum (admin only)
/// GET    /{id}             -> get_forum
/// GET    /{id}/messages    -> list_forum_messages (?order)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(forums::list_forums).post(forums::create_forum))
        .route("/{id}", get(forums::get_forum))
        .route("/{id}/messages", get(messages::list_forum_messages))
}
