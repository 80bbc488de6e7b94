//! Agora domain logic.
//!
//! Pure, I/O-free building blocks shared by the persistence and API layers:
//! shared id/timestamp types, the domain error taxonomy, message content and
//! permission rules, forum visibility rules, and the thread-tree algorithms
//! (nested assembly with a depth guard, descendant collection).

pub mod error;
pub mod forums;
pub mod messages;
pub mod thread;
pub mod types;
