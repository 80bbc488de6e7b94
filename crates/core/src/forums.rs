//! Forum visibility rules and validation.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a forum name.
pub const MAX_FORUM_NAME_LENGTH: usize = 100;

/// Forum visibility class: who may read its threads.
pub const VISIBILITY_OPEN: &str = "open";
pub const VISIBILITY_CLOSED: &str = "closed";

/// All valid visibility values.
pub const VALID_VISIBILITIES: &[&str] = &[VISIBILITY_OPEN, VISIBILITY_CLOSED];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a forum name: non-empty, within the length limit.
pub fn validate_forum_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Forum name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_FORUM_NAME_LENGTH {
        return Err(format!(
            "Forum name exceeds maximum length of {MAX_FORUM_NAME_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Validate that the visibility string is one of the accepted values.
pub fn validate_visibility(visibility: &str) -> Result<(), String> {
    if VALID_VISIBILITIES.contains(&visibility) {
        Ok(())
    } else {
        Err(format!(
            "Invalid visibility '{visibility}'. Must be one of: {}",
            VALID_VISIBILITIES.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Check whether an actor may read a forum's threads.
///
/// Open forums are readable by everyone; closed forums only by admins.
/// Unknown visibility values deny by default.
pub fn can_view_forum(visibility: &str, is_admin: bool) -> bool {
    match visibility {
        VISIBILITY_OPEN => true,
        VISIBILITY_CLOSED => is_admin,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
