use std::env;

use url::Url;

use learn_core::model::{ApiSettings, ApiSettingsDraft};

use crate::error::ConfigError;

/// Topic taught when nothing else is configured.
pub const DEFAULT_TOPIC_ID: &str = "64f572ac-03e3-42d2-b81e-0baf063738b7";

/// Validated configuration for the services layer.
#[derive(Clone, Debug)]
pub struct ServicesConfig {
    pub api: ApiSettings,
    pub force_update: bool,
    /// Origin serving the release manifest. Update checks are off without it.
    pub app_origin: Option<Url>,
    pub build_version: String,
}

/// Raw configuration, filled from the environment and then overridden by
/// command-line flags.
#[derive(Clone, Debug, Default)]
pub struct ServicesConfigDraft {
    pub api: ApiSettingsDraft,
    pub force_update: bool,
    pub app_origin: Option<String>,
    pub build_version: Option<String>,
}

impl ServicesConfigDraft {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a draft from any key lookup (the environment in production).
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api = ApiSettingsDraft {
            base_url: lookup("NEXTGRADES_API_BASE_URL"),
            user_id: lookup("NEXTGRADES_USER_ID"),
            topic_id: lookup("NEXTGRADES_TOPIC_ID").or_else(|| Some(DEFAULT_TOPIC_ID.into())),
        };
        let force_update = lookup("NEXTGRADES_FORCE_UPDATE")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        Self {
            api,
            force_update,
            app_origin: lookup("NEXTGRADES_APP_ORIGIN"),
            build_version: None,
        }
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API settings are incomplete or the app
    /// origin is not a URL.
    pub fn validate(self) -> Result<ServicesConfig, ConfigError> {
        let api = self.api.validate()?;
        let app_origin = match self
            .app_origin
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
        {
            Some(origin) => {
                Some(Url::parse(&origin).map_err(|_| ConfigError::InvalidOrigin(origin))?)
            }
            None => None,
        };
        let build_version = self
            .build_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        Ok(ServicesConfig {
            api,
            force_update: self.force_update,
            app_origin,
            build_version,
        })
    }
}
