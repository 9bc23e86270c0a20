//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use toeic_core::FetchError;

use crate::sessions::SessionPhase;

/// Errors emitted by the lesson session and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Submit was pressed without choosing an option. Recoverable.
    #[error("choose an answer before checking it")]
    NoSelection,

    /// An operation was invoked in a phase that forbids it.
    #[error("{operation} is not allowed while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },
}

impl SessionError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::NoSelection)
    }

    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, SessionError::InvalidState { .. })
    }
}

/// Errors emitted by `AuthContext`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,

    /// The auth service refused the request; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error("login response did not include a user")]
    MissingUser,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} is not a valid URL: {value}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("{key} must be a positive integer: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("failed to read config file {path}: {message}")]
    File { path: String, message: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
