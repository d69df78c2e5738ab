//! Error taxonomy for list operations.

use thiserror::Error;

/// Message shown to users for failures they cannot act on.
pub const GENERIC_FAILURE: &str = "Something went wrong.";

/// Errors raised by the write side of the library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Input rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(String),
    /// A referenced catalog or list entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation would violate list uniqueness.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Anything else, typically a persistence failure.
    #[error("internal error: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Stable classification of a [`LibraryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input.
    Validation,
    /// Missing catalog or list entry.
    NotFound,
    /// Duplicate list entry.
    Conflict,
    /// Store or other unexpected failure.
    Internal,
}

impl ErrorKind {
    /// Machine-readable code, e.g. `not_found`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal_error",
        }
    }
}

impl LibraryError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Message suitable for an end user; internal failures are replaced by
    /// [`GENERIC_FAILURE`] while `Display` keeps the details.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::NotFound(message) | Self::Conflict(message) => {
                message.clone()
            }
            Self::Store(_) => GENERIC_FAILURE.to_string(),
        }
    }
}
