//! Error types for ProposalKit.
//!
//! Library crates use [`ProposalKitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ProposalKit operations.
#[derive(Debug, thiserror::Error)]
pub enum ProposalKitError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A source document could not be opened or decoded.
    #[error("document error at {path:?}: {message}")]
    Document { path: PathBuf, message: String },

    /// A stage input file is missing or malformed.
    #[error("input error at {path:?}: {message}")]
    Input { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON or CSV encoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catalog database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProposalKitError>;

impl ProposalKitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a document error for the file at `path`.
    pub fn document(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Document {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an input error for the stage file at `path`.
    pub fn input(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
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

impl From<serde_json::Error> for ProposalKitError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ProposalKitError::config("bad threshold");
        assert_eq!(err.to_string(), "config error: bad threshold");

        let err = ProposalKitError::input("database_resources.json", "file not found");
        assert!(err.to_string().contains("database_resources.json"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn document_error_names_path() {
        let err = ProposalKitError::document("/tmp/a.docx", "not a zip archive");
        let msg = err.to_string();
        assert!(msg.starts_with("document error"));
        assert!(msg.contains("a.docx"));
    }
}
