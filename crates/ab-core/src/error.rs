//! Error types for registry lookups, property edits, and persistence.

use crate::props::ComponentKind;
use thiserror::Error;

/// A kind tag with no registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown component kind: {0}")]
pub struct UnknownKindError(pub ComponentKind);

/// A rejected property, style, or custom-code edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    #[error("`{value}` is not a number for property `{key}`")]
    NotANumber { key: String, value: String },

    #[error("`{value}` is not one of the options for property `{key}`")]
    NotAnOption { key: String, value: String },

    #[error("invalid value for property `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("unknown custom code slot: {0}")]
    UnknownSlot(String),
}

/// Failures reading or writing the persisted document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed project JSON: {0}")]
    Json(#[from] serde_json::Error),
}
