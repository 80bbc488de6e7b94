//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`ForumEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use agora_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A message was created (root or reply).
pub const EVENT_MESSAGE_CREATED: &str = "message.created";

/// A message's content was edited.
pub const EVENT_MESSAGE_UPDATED: &str = "message.updated";

/// A single message was soft-deleted.
pub const EVENT_MESSAGE_DELETED: &str = "message.deleted";

/// A message and its whole reply subtree were soft-deleted.
pub const EVENT_MESSAGE_CASCADE_DELETED: &str = "message.cascade_deleted";

// ---------------------------------------------------------------------------
// ForumEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the platform.
///
/// Constructed via [`ForumEvent::new`] and enriched with the builder methods
/// [`with_forum`](ForumEvent::with_forum), [`with_actor`](ForumEvent::with_actor),
/// and [`with_payload`](ForumEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumEvent {
    /// Dot-separated event name, e.g. `"message.created"`.
    pub event_type: String,

    /// Forum the event is scoped to, when applicable.
    pub forum_id: Option<DbId>,

    /// Id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl ForumEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            forum_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Scope the event to a forum.
    pub fn with_forum(mut self, forum_id: DbId) -> Self {
        self.forum_id = Some(forum_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ForumEvent`].
pub struct EventBus {
    sender: broadcast::Sender<ForumEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ForumEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ForumEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = ForumEvent::new(EVENT_MESSAGE_CREATED)
            .with_forum(42)
            .with_actor(7)
            .with_payload(serde_json::json!({"id": 99}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "message.created");
        assert_eq!(received.forum_id, Some(42));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload["id"], 99);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ForumEvent::new(EVENT_MESSAGE_DELETED));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, "message.deleted");
        assert_eq!(e2.event_type, "message.deleted");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        // No subscribers -- this must not panic.
        bus.publish(ForumEvent::new(EVENT_MESSAGE_UPDATED));
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = ForumEvent::new("bare.event");
        assert_eq!(event.event_type, "bare.event");
        assert!(event.forum_id.is_none());
        assert!(event.actor_user_id.is_none());
        assert!(event.payload.is_object());
    }
}
