//! Error types for vaulticon
//!
//! All modules use `VaultIconResult<T>` as their return type. Per-entry
//! fetch failures are not errors: they travel as `FetchOutcome` values.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vaulticon operations
pub type VaultIconResult<T> = Result<T, VaultIconError>;

/// All errors that can occur in vaulticon
#[derive(Error, Debug)]
pub enum VaultIconError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid icon service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Icon service URL cannot take path segments: {0}")]
    InvalidBaseUrl(String),

    // Cache errors
    #[error("Failed to create icon cache directory {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Lock errors
    #[error("Icon sync already in progress (lock held at {0})")]
    SyncInProgress(PathBuf),

    #[error("Failed to release sync lock {path}: {source}")]
    LockRelease {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Entry errors
    #[error("Invalid entry id {id:?}: {reason}")]
    InvalidEntryId { id: String, reason: &'static str },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultIconError {
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

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SyncInProgress(_) => {
                Some("Wait for the running sync, or run: vaulticon sync --force if it crashed")
            }
            Self::CommandExecution { .. } => Some("Make sure the vault is unlocked: rbw unlock"),
            Self::CommandFailed { .. } => Some("Install rbw or set entries.command in the config"),
            Self::CacheDirCreate { .. } => Some("Check icons.cache_dir in the config"),
            _ => None,
        }
    }
}
