use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::ForumHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: agora_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Room-scoped WebSocket fan-out hub.
    pub hub: Arc<ForumHub>,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<agora_events::EventBus>,
}
