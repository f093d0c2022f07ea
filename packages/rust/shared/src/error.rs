//! Error types for adlib.
//!
//! Library crates use [`AdLibError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all adlib operations.
///
/// Partial results (timeouts, exhausted retries) are not errors; they travel
/// as a [`Shortfall`](crate::Shortfall) alongside the extracted records.
#[derive(Debug, thiserror::Error)]
pub enum AdLibError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The browsing session could not be acquired, driven, or released.
    #[error("session unavailable: {0}")]
    Session(String),

    /// No page is loaded, so no document snapshot can be taken.
    #[error("snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Caller input rejected before the run starts.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AdLibError>;

impl AdLibError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a session error from any displayable message.
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
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
