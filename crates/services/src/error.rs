//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::ApiFailure;
use learn_core::model::ApiSettingsError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by tutoring backend clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("tutor request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("tutor response could not be decoded: {0}")]
    Decode(String),
    #[error(transparent)]
    Api(#[from] ApiFailure),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Collapse into the code/message pair the session controller stores.
    #[must_use]
    pub fn into_failure(self) -> ApiFailure {
        match self {
            ApiError::Api(failure) => failure,
            ApiError::HttpStatus(status) => ApiFailure::new(
                format!("http_{}", status.as_u16()),
                format!("The tutor service returned an error ({status})."),
            ),
            ApiError::Decode(_) => ApiFailure::new(
                "invalid_response",
                "The tutor service sent a response we could not read.",
            ),
            ApiError::Transport(_) => ApiFailure::new(
                "network_error",
                "Unable to reach the tutor. Check your connection and try again.",
            ),
        }
    }
}

/// Errors emitted by update probes and the app shell.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdateError {
    #[error("update check is not configured")]
    Disabled,
    #[error("release manifest request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("no waiting version to activate")]
    NothingWaiting,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while reading service configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Api(#[from] ApiSettingsError),
    #[error("invalid app origin: {0}")]
    InvalidOrigin(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
