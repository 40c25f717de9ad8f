//! Error types for Desklink.
//!
//! Errors returned from this crate are fatal for the operation that produced
//! them. Recoverable problems (a single account that could not be reached, an
//! icon that failed to copy) never surface here; they are collected as
//! [`crate::shortcut::ShortcutWarning`] values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Desklink library.
#[derive(Debug, Error)]
pub enum DesklinkError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Shortcut configuration errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unknown placeholder: {0}")]
    UnknownPlaceholder(String),

    // Collaborator errors
    #[error("Resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("Script {name} failed: {message}")]
    ScriptFailed { name: String, message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Desklink operations.
pub type Result<T> = std::result::Result<T, DesklinkError>;

impl From<std::io::Error> for DesklinkError {
    fn from(err: std::io::Error) -> Self {
        DesklinkError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for DesklinkError {
    fn from(err: serde_json::Error) -> Self {
        DesklinkError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl DesklinkError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DesklinkError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an IO error with a short description of the failed action.
    pub fn io_action(action: &str, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        DesklinkError::Io {
            message: action.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error must abort the current shortcut.
    ///
    /// Missing resources and failed scripts only disable an optional
    /// strategy; everything else stops the shortcut being saved.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DesklinkError::ResourceNotFound { .. } | DesklinkError::ScriptFailed { .. }
        )
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            DesklinkError::Io { path, .. } => path.as_deref(),
            DesklinkError::NotADirectory(path) => Some(path),
            _ => None,
        }
    }
}
