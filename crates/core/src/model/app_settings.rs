use thiserror::Error;
use url::Url;

use crate::model::{TopicId, UserId};

/// Validated connection settings for the tutoring backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiSettings {
    base_url: Url,
    user_id: UserId,
    topic_id: TopicId,
}

#[derive(Clone, Debug, Default)]
pub struct ApiSettingsDraft {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
    pub topic_id: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiSettingsError {
    #[error("API base URL is missing")]
    MissingBaseUrl,
    #[error("invalid base URL")]
    InvalidBaseUrl,
    #[error("user id is missing")]
    MissingUserId,
    #[error("topic id is missing")]
    MissingTopicId,
    #[error("invalid topic id: {0}")]
    InvalidTopicId(String),
}

impl ApiSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ApiSettingsError` if a field is missing or malformed.
    pub fn validate(self) -> Result<ApiSettings, ApiSettingsError> {
        let base_url = normalize_optional(self.base_url).ok_or(ApiSettingsError::MissingBaseUrl)?;
        let user_id = normalize_optional(self.user_id).ok_or(ApiSettingsError::MissingUserId)?;
        let topic_id = normalize_optional(self.topic_id).ok_or(ApiSettingsError::MissingTopicId)?;

        let base_url = Url::parse(&base_url).map_err(|_| ApiSettingsError::InvalidBaseUrl)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiSettingsError::InvalidBaseUrl);
        }
        let topic_id = topic_id
            .parse::<TopicId>()
            .map_err(|_| ApiSettingsError::InvalidTopicId(topic_id.clone()))?;

        Ok(ApiSettings {
            base_url,
            user_id: UserId::new(user_id),
            topic_id,
        })
    }
}

impl ApiSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// Join an endpoint path onto the base URL, keeping any base path prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
