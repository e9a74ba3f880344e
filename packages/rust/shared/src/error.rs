//! Error types for Adit.
//!
//! Library crates use [`AditError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Adit operations.
#[derive(Debug, thiserror::Error)]
pub enum AditError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Graph store or query error raised by a graph collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// A path or grouping references a key the node lookup cannot resolve.
    #[error("reference error: {message}")]
    Reference { message: String },

    /// A catalog operation was invoked out of order.
    #[error("illegal state: {message}")]
    IllegalState { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed predicate, invalid option, bad export).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AditError>;

impl AditError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a reference error from any displayable message.
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference {
            message: msg.into(),
        }
    }

    /// Create an illegal-state error from any displayable message.
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
