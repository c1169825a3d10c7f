//! Error types for jaarverslag.
//!
//! Library crates use [`JaarverslagError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-document fetch failures are *not* represented here: the fetcher
//! absorbs them into its own outcome type so a single bad URL never surfaces
//! as an `Err` to the batch.

use std::path::PathBuf;

/// Top-level error type for all jaarverslag operations.
#[derive(Debug, thiserror::Error)]
pub enum JaarverslagError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while collecting source listings.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid argument or data shape (programming error at the call site).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// CSV table read/write error.
    #[error("table error: {0}")]
    Table(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, JaarverslagError>;

impl JaarverslagError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = JaarverslagError::config("listing_pages must be positive");
        assert_eq!(err.to_string(), "config error: listing_pages must be positive");

        let err = JaarverslagError::validation("max_pages must be at least 1");
        assert!(err.to_string().contains("max_pages"));

        let err = JaarverslagError::Table("missing column Urls".into());
        assert_eq!(err.to_string(), "table error: missing column Urls");
    }

    #[test]
    fn io_error_carries_path() {
        let err = JaarverslagError::io(
            "/tmp/missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("missing.csv"));
    }
}
