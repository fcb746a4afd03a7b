//! Error types for Buildy
//!
//! All modules use `BuildyResult<T>` as their return type. Only failures to
//! set a build up (directory, log file, process spawn) are errors; a build
//! whose pipeline fails is reported through its status instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Buildy operations
pub type BuildyResult<T> = Result<T, BuildyError>;

/// All errors that can occur in Buildy
#[derive(Error, Debug)]
pub enum BuildyError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Build errors
    #[error("Build directory already exists: {0}")]
    BuildDirExists(PathBuf),

    #[error("Failed to create build directory {path}: {source}")]
    BuildDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Server errors
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BuildyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: buildy config show"),
            Self::BuildDirCreate { .. } => {
                Some("Check that the build directory exists and is writable")
            }
            Self::Bind { .. } => Some("Pick another port with --port or BUILDY_PORT"),
            Self::CommandFailed { .. } => Some("Make sure `sh` and `git` are on PATH"),
            _ => None,
        }
    }
}
