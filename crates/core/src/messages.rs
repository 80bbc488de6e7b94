//! Message constants, validation, and permission rules.
//!
//! Provides the tombstone placeholder, content validation, the
//! author-or-admin mutation rule, and root listing order parsing.

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of message content in characters.
pub const MAX_MESSAGE_CONTENT_LENGTH: usize = 10_000;

/// Placeholder written over the content of a soft-deleted message.
///
/// Deleted messages keep their id and position in the reply tree; only the
/// visible content is replaced by this fixed string.
pub const TOMBSTONE_CONTENT: &str = "[This message has been deleted]";

// ---------------------------------------------------------------------------
// Listing order
// ---------------------------------------------------------------------------

/// Sort order for root message listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Newest first (`created_at` descending). The default.
    Newest,
    /// Oldest first (`created_at` ascending), for chronological display.
    Oldest,
}

impl ListOrder {
    /// Parse an `order` query parameter. `None` and unrecognized values
    /// fall back to newest-first.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("asc") => ListOrder::Oldest,
            _ => ListOrder::Newest,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate message content: must be non-empty and within the length limit.
pub fn validate_message_content(content: &str) -> Result<(), String> {
    if content.is_empty() {
        return Err("Message content cannot be empty".to_string());
    }
    if content.chars().count() > MAX_MESSAGE_CONTENT_LENGTH {
        return Err(format!(
            "Message content exceeds maximum length of {MAX_MESSAGE_CONTENT_LENGTH} characters"
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Check whether an actor may edit or delete a message.
///
/// Only the message's author or an admin may mutate it.
pub fn can_modify_message(actor_id: DbId, actor_is_admin: bool, author_id: DbId) -> bool {
    actor_is_admin || actor_id == author_id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
