//! Host collaborators: update probing, version activation, reloads and
//! app installation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

use learn_core::install::InstallPlatform;

use crate::error::UpdateError;

/// Path of the worker script used as the reachability check.
pub const WORKER_SCRIPT_PATH: &str = "sw.js";
/// Path of the release manifest describing the newest build.
pub const RELEASE_MANIFEST_PATH: &str = "version.json";

/// Finds out whether a newer build is waiting.
#[async_trait]
pub trait UpdateProbe: Send + Sync {
    /// Whether the update origin answers at all. Never errors: any failure
    /// counts as unreachable.
    async fn check_reachable(&self) -> bool;

    /// Ask for the newest build; a newer one is announced on [`subscribe`].
    ///
    /// # Errors
    ///
    /// Returns `UpdateError` if the manifest cannot be fetched.
    ///
    /// [`subscribe`]: UpdateProbe::subscribe
    async fn check_for_update(&self) -> Result<(), UpdateError>;

    /// Version of the waiting build, `None` while there is none.
    fn subscribe(&self) -> watch::Receiver<Option<String>>;
}

/// The running application as seen by the update flow.
#[async_trait]
pub trait AppShell: Send + Sync {
    /// Make the waiting build the active one.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError` if there is nothing to activate.
    async fn activate_new_version(&self) -> Result<(), UpdateError>;

    /// Reload the app so the active build is used.
    fn reload(&self);
}

/// Platform hooks behind the install banner.
#[async_trait]
pub trait InstallHost: Send + Sync {
    fn platform(&self) -> InstallPlatform;

    /// Already running as an installed app.
    fn is_standalone(&self) -> bool;

    /// Flips to `true` once a native install prompt has been captured.
    fn subscribe_available(&self) -> watch::Receiver<bool>;

    /// Show the captured native prompt. Returns whether the user accepted.
    async fn prompt_install(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct ReleaseManifest {
    version: String,
}

#[derive(Debug)]
struct ReleaseState {
    current: Mutex<String>,
    waiting: watch::Sender<Option<String>>,
}

/// Checks a release manifest on the app origin for builds newer than the
/// one running.
#[derive(Clone)]
pub struct HttpUpdateProbe {
    client: Client,
    origin: Url,
    release: Arc<ReleaseState>,
}

impl HttpUpdateProbe {
    #[must_use]
    pub fn new(origin: Url, current_version: impl Into<String>) -> Self {
        let (waiting, _) = watch::channel(None);
        Self {
            client: Client::new(),
            origin,
            release: Arc::new(ReleaseState {
                current: Mutex::new(current_version.into()),
                waiting,
            }),
        }
    }

    /// Shell that activates the builds this probe finds.
    #[must_use]
    pub fn shell(&self) -> ReleaseShell {
        let (reloads, _) = watch::channel(0);
        ReleaseShell {
            release: Arc::clone(&self.release),
            reloads: Arc::new(reloads),
        }
    }

    #[must_use]
    pub fn current_version(&self) -> String {
        self.release.current_version()
    }

    fn url(&self, path: &str) -> Result<Url, UpdateError> {
        self.origin.join(path).map_err(|_| UpdateError::Disabled)
    }

    /// Record the manifest's version. Returns whether it is a new waiting build.
    fn observe_version(&self, version: &str) -> bool {
        let version = version.trim();
        if version.is_empty() || version == self.release.current_version() {
            return false;
        }
        self.release.waiting.send_if_modified(|waiting| {
            if waiting.as_deref() == Some(version) {
                false
            } else {
                *waiting = Some(version.to_string());
                true
            }
        })
    }
}

impl ReleaseState {
    fn current_version(&self) -> String {
        match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl UpdateProbe for HttpUpdateProbe {
    async fn check_reachable(&self) -> bool {
        let Ok(url) = self.url(WORKER_SCRIPT_PATH) else {
            return false;
        };
        match self
            .client
            .head(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
        {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(err) => {
                debug!(error = %err, "update origin unreachable");
                false
            }
        }
    }

    async fn check_for_update(&self) -> Result<(), UpdateError> {
        let response = self
            .client
            .get(self.url(RELEASE_MANIFEST_PATH)?)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UpdateError::HttpStatus(response.status()));
        }
        let manifest: ReleaseManifest = response.json().await?;
        if self.observe_version(&manifest.version) {
            info!(version = %manifest.version, "new build is waiting");
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.release.waiting.subscribe()
    }
}

/// `AppShell` for builds found by [`HttpUpdateProbe`]. Reload requests are
/// published for the view layer to act on.
#[derive(Clone)]
pub struct ReleaseShell {
    release: Arc<ReleaseState>,
    reloads: Arc<watch::Sender<u64>>,
}

impl ReleaseShell {
    /// Counter bumped once per reload request.
    #[must_use]
    pub fn subscribe_reloads(&self) -> watch::Receiver<u64> {
        self.reloads.subscribe()
    }
}

#[async_trait]
impl AppShell for ReleaseShell {
    async fn activate_new_version(&self) -> Result<(), UpdateError> {
        let Some(version) = self.release.waiting.send_replace(None) else {
            return Err(UpdateError::NothingWaiting);
        };
        match self.release.current.lock() {
            Ok(mut guard) => *guard = version.clone(),
            Err(poisoned) => *poisoned.into_inner() = version.clone(),
        }
        info!(%version, "activated new build");
        Ok(())
    }

    fn reload(&self) {
        self.reloads.send_modify(|count| *count += 1);
    }
}

/// Install hooks for the desktop build, which always runs installed.
#[derive(Clone)]
pub struct DesktopInstallHost {
    available: Arc<watch::Sender<bool>>,
}

impl DesktopInstallHost {
    #[must_use]
    pub fn new() -> Self {
        let (available, _) = watch::channel(false);
        Self {
            available: Arc::new(available),
        }
    }
}

impl Default for DesktopInstallHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstallHost for DesktopInstallHost {
    fn platform(&self) -> InstallPlatform {
        InstallPlatform::Standard
    }

    fn is_standalone(&self) -> bool {
        true
    }

    fn subscribe_available(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }

    async fn prompt_install(&self) -> bool {
        false
    }
}
