//! Error types for Ghostwriter.
//!
//! Library crates use [`GhostwriterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Ghostwriter operations.
#[derive(Debug, thiserror::Error)]
pub enum GhostwriterError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure (connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// A remote API answered with a non-success status.
    #[error("{service} API error: HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Response or input parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// State file error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Chat-completion error (empty reply, tool loop overrun).
    #[error("llm error: {0}")]
    Llm(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A polled remote job did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GhostwriterError>;

impl GhostwriterError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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
