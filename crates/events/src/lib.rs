//! Agora event bus.
//!
//! In-process publish/subscribe plumbing for domain events:
//!
//! - [`EventBus`] -- fan-out hub backed by `tokio::sync::broadcast`.
//! - [`ForumEvent`] -- the canonical domain event envelope.
//!
//! Message handlers publish an event after every successful mutation; the
//! API layer's broadcaster consumes the stream and relays creations to
//! WebSocket forum rooms.

pub mod bus;

pub use bus::{EventBus, ForumEvent};
pub use bus::{
    EVENT_MESSAGE_CASCADE_DELETED, EVENT_MESSAGE_CREATED, EVENT_MESSAGE_DELETED,
    EVENT_MESSAGE_UPDATED,
};
