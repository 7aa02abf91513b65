//! Error types for Strata.
//!
//! This module provides a unified error handling approach using `thiserror`.
//! Only data access can fail; formatting, layout and search never return errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Errors that can occur in Strata.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Failed to open a file.
    #[error("Failed to open file: {path}")]
    FileOpen {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to decode JSON.
    #[error("Invalid JSON in {context}: {source}")]
    Json {
        /// What was being decoded (file path or URL).
        context: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status} from {url})")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided error message, or the canonical reason.
        message: String,
    },

    /// Malformed URL or source path.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Named query does not exist in the source.
    #[error("Query not found: {name}")]
    QueryNotFound {
        /// Query name.
        name: String,
    },

    /// Detail record does not exist in the source.
    #[error("Record not found: {path}")]
    RecordNotFound {
        /// Source path that was requested.
        path: String,
    },

    /// Manifest could not be interpreted at all.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A response did not have the expected shape.
    #[error("Unexpected response from {0}")]
    InvalidResponse(String),

    /// Annotation request was rejected.
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Failed to access clipboard.
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),
}

impl StrataError {
    /// Create a FileOpen error.
    pub fn file_open(path: PathBuf, source: std::io::Error) -> Self {
        Self::FileOpen { path, source }
    }

    /// Create a Json error.
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Create a Status error.
    pub fn status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a QueryNotFound error.
    pub fn query_not_found(name: impl Into<String>) -> Self {
        Self::QueryNotFound { name: name.into() }
    }

    /// Create a RecordNotFound error.
    pub fn record_not_found(path: impl Into<String>) -> Self {
        Self::RecordNotFound { path: path.into() }
    }
}
