use std::sync::Arc;

use storage::repository::{FlagKey, Storage};

use crate::Clock;
use crate::api::{HttpTutorApi, TutorApi};
use crate::config::ServicesConfig;
use crate::error::AppServicesError;
use crate::install_service::InstallService;
use crate::platform::{AppShell, DesktopInstallHost, HttpUpdateProbe, InstallHost, ReleaseShell};
use crate::tutor_service::TutorSessionService;
use crate::update_service::UpdateService;

/// Assembles app-facing services.
#[derive(Clone)]
pub struct AppServices {
    tutor: Arc<TutorSessionService>,
    updates: Option<Arc<UpdateService>>,
    release_shell: Option<ReleaseShell>,
    install: Arc<InstallService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: ServicesConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_config(storage, config, clock))
    }

    /// Build services on top of an existing storage.
    #[must_use]
    pub fn from_config(storage: Storage, config: ServicesConfig, clock: Clock) -> Self {
        let api: Arc<dyn TutorApi> = Arc::new(HttpTutorApi::new(config.api.clone()));
        let tutor = TutorSessionService::new(api, config.api.clone(), clock);

        let (updates, release_shell) = match config.app_origin.clone() {
            Some(origin) => {
                let probe = HttpUpdateProbe::new(origin, config.build_version.clone());
                let shell = probe.shell();
                let shell_ref: Arc<dyn AppShell> = Arc::new(shell.clone());
                let updates = UpdateService::new(
                    Arc::new(probe),
                    shell_ref,
                    storage.flags_for(FlagKey::UpdateDismissed),
                    clock,
                    config.force_update,
                );
                (Some(Arc::new(updates)), Some(shell))
            }
            None => (None, None),
        };

        let host: Arc<dyn InstallHost> = Arc::new(DesktopInstallHost::new());
        let install = InstallService::new(host, storage.flags_for(FlagKey::InstallDismissed), clock);

        Self {
            tutor: Arc::new(tutor),
            updates,
            release_shell,
            install: Arc::new(install),
        }
    }

    /// Assemble from already-built parts.
    #[must_use]
    pub fn from_parts(
        tutor: TutorSessionService,
        updates: Option<UpdateService>,
        install: InstallService,
    ) -> Self {
        Self {
            tutor: Arc::new(tutor),
            updates: updates.map(Arc::new),
            release_shell: None,
            install: Arc::new(install),
        }
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorSessionService> {
        Arc::clone(&self.tutor)
    }

    /// `None` when no app origin is configured.
    #[must_use]
    pub fn updates(&self) -> Option<Arc<UpdateService>> {
        self.updates.as_ref().map(Arc::clone)
    }

    #[must_use]
    pub fn release_shell(&self) -> Option<ReleaseShell> {
        self.release_shell.clone()
    }

    #[must_use]
    pub fn install(&self) -> Arc<InstallService> {
        Arc::clone(&self.install)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServicesConfigDraft;
    use learn_core::model::ApiSettingsDraft;
    use learn_core::time::fixed_clock;

    fn config(origin: Option<&str>) -> ServicesConfig {
        ServicesConfigDraft {
            api: ApiSettingsDraft {
                base_url: Some("https://api.example.com".into()),
                user_id: Some("student-1".into()),
                topic_id: Some("64f572ac-03e3-42d2-b81e-0baf063738b7".into()),
            },
            force_update: true,
            app_origin: origin.map(str::to_string),
            build_version: Some("1.0.0".into()),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn updates_need_an_origin() {
        let services = AppServices::from_config(Storage::in_memory(), config(None), fixed_clock());
        assert!(services.updates().is_none());
        assert!(services.release_shell().is_none());
    }

    #[test]
    fn origin_enables_update_flow() {
        let services = AppServices::from_config(
            Storage::in_memory(),
            config(Some("https://app.example.com/")),
            fixed_clock(),
        );
        let updates = services.updates().expect("update service");
        assert!(updates.force_update());
        assert!(services.release_shell().is_some());
        assert_eq!(
            services.tutor().settings().user_id().as_str(),
            "student-1"
        );
    }
}
