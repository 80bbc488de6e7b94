//! Event-bus-to-room relay.
//!
//! [`ForumBroadcaster`] subscribes to the domain event bus and hands message
//! creations and edits to the fan-out hub, so REST-created messages reach
//! room subscribers even when the creating client never announces them on
//! its own socket. The hub's shared dedupe cache collapses the REST-origin
//! and socket-origin announcements of the same message id.

use std::sync::Arc;

use tokio::sync::broadcast;

use agora_events::{ForumEvent, EVENT_MESSAGE_CREATED, EVENT_MESSAGE_UPDATED};

use crate::ws::protocol::MessagePayload;
use crate::ws::ForumHub;

/// Routes domain events to WebSocket forum rooms.
pub struct ForumBroadcaster {
    hub: Arc<ForumHub>,
}

impl ForumBroadcaster {
    /// Create a new broadcaster over the given hub.
    pub fn new(hub: Arc<ForumHub>) -> Self {
        Self { hub }
    }

    /// Run the main relay loop.
    ///
    /// Consumes events from the broadcast channel until it is closed (i.e.
    /// the [`EventBus`](agora_events::EventBus) is dropped during shutdown).
    pub async fn run(self, mut receiver: broadcast::Receiver<ForumEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Forum broadcaster lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, forum broadcaster shutting down");
                    break;
                }
            }
        }
    }

    /// Relay a single event to the hub, when it carries a relayable payload.
    ///
    /// Deletions do not fan out: clients re-fetch thread state over REST and
    /// see the tombstones there.
    async fn handle_event(&self, event: &ForumEvent) {
        match event.event_type.as_str() {
            EVENT_MESSAGE_CREATED | EVENT_MESSAGE_UPDATED => {
                match serde_json::from_value::<MessagePayload>(event.payload.clone()) {
                    Ok(payload) => {
                        let relayed = self.hub.broadcast_message(&payload).await;
                        tracing::debug!(
                            event_type = %event.event_type,
                            forum_id = ?event.forum_id,
                            relayed,
                            "Relayed message event to forum room"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            event_type = %event.event_type,
                            error = %e,
                            "Malformed message payload on event bus"
                        );
                    }
                }
            }
            _ => {}
        }
    }
}
