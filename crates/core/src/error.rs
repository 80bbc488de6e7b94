use crate::types::DbId;

/// Domain error taxonomy shared by every layer above the store.
///
/// `Validation`, `NotFound`, and `Forbidden` are detected before any mutation
/// is applied; `Internal` covers store-unavailable conditions that are logged
/// and surfaced without taking the process down.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
