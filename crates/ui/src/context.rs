use std::sync::Arc;

use services::{InstallService, TutorSessionService, UpdateService};
use tokio::sync::watch;

pub trait UiApp: Send + Sync {
    fn tutor(&self) -> Arc<TutorSessionService>;
    /// `None` when no release origin is configured.
    fn updates(&self) -> Option<Arc<UpdateService>>;
    fn install(&self) -> Arc<InstallService>;

    /// Ticks once per completed update reload.
    fn reloads(&self) -> Option<watch::Receiver<u64>>;
}

#[derive(Clone)]
pub struct AppContext {
    tutor: Arc<TutorSessionService>,
    updates: Option<Arc<UpdateService>>,
    install: Arc<InstallService>,
    reloads: Option<watch::Receiver<u64>>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            tutor: app.tutor(),
            updates: app.updates(),
            install: app.install(),
            reloads: app.reloads(),
        }
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorSessionService> {
        Arc::clone(&self.tutor)
    }

    #[must_use]
    pub fn updates(&self) -> Option<Arc<UpdateService>> {
        self.updates.clone()
    }

    #[must_use]
    pub fn install(&self) -> Arc<InstallService> {
        Arc::clone(&self.install)
    }

    #[must_use]
    pub fn reloads(&self) -> Option<watch::Receiver<u64>> {
        self.reloads.clone()
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
