//! Error types for editor sessions and collaborator transports.

use ab_core::{BindingError, ComponentId, PageId, PersistenceError, UnknownKindError};
use thiserror::Error;

/// Errors from explicit editor operations. Degrading paths (a failed
/// write-through save, an edit on a locked canvas) log instead.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("component not found on the current page: {0}")]
    ComponentNotFound(ComponentId),

    #[error("page not found: {0}")]
    PageNotFound(PageId),
}

/// Failures of a collaborator run. These end up as the record's `error`
/// string and never leave the runner.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other failure reported by a transport implementation.
    #[error("{0}")]
    Failed(String),
}
