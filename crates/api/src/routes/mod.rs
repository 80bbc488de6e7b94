pub mod forums;
pub mod health;
pub mod messages;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                          WebSocket upgrade (rooms + fan-out)
///
/// /forums                      list (GET), create (POST, admin only)
/// /forums/{id}                 get forum
/// /forums/{id}/messages        list root messages (?order=asc|desc)
///
/// /messages                    create message or reply (POST)
/// /messages/{id}               get, edit (PUT), soft-delete (DELETE)
/// /messages/{id}/thread        nested reply tree (?depth=, default 5)
/// /messages/{id}/tree          cascade-delete whole subtree (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/forums", forums::router())
        .nest("/messages", messages::router())
}
