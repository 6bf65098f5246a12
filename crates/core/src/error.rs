use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ApiSettingsError;

/// Typed failure reported by the tutoring backend or the transport under it.
///
/// `code` is machine readable (e.g. `"JOB_NOT_FOUND"`, `"network_error"`); `message`
/// is meant for the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub code: String,
    pub message: String,
}

impl ApiFailure {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiFailure),
    #[error(transparent)]
    Settings(#[from] ApiSettingsError),
}
