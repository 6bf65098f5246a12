//! Process-wide driver for the "update available" notice and the periodic
//! update probe.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use learn_core::update::{DEFAULT_PROBE_INTERVAL, UpdateCommand, UpdateEvent, UpdateNotice};
use storage::repository::{FlagKey, FlagRepository};

use crate::Clock;
use crate::platform::{AppShell, UpdateProbe};

const DISMISSED_VALUE: &str = "1";

#[derive(Clone)]
pub struct UpdateService {
    probe: Arc<dyn UpdateProbe>,
    shell: Arc<dyn AppShell>,
    flags: Arc<dyn FlagRepository>,
    clock: Clock,
    force_update: bool,
    probe_interval: Duration,
}

impl UpdateService {
    /// `flags` must be the session-scoped store.
    #[must_use]
    pub fn new(
        probe: Arc<dyn UpdateProbe>,
        shell: Arc<dyn AppShell>,
        flags: Arc<dyn FlagRepository>,
        clock: Clock,
        force_update: bool,
    ) -> Self {
        Self {
            probe,
            shell,
            flags,
            clock,
            force_update,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_probe_interval(mut self, probe_interval: Duration) -> Self {
        self.probe_interval = probe_interval;
        self
    }

    #[must_use]
    pub fn force_update(&self) -> bool {
        self.force_update
    }

    /// Load the stored dismissal, then start the notice and probe loop.
    /// Must run inside a tokio runtime.
    pub async fn start(&self) -> UpdateHandle {
        let previously_dismissed = match self.flags.get_flag(FlagKey::UpdateDismissed).await {
            Ok(record) => record.is_some(),
            Err(err) => {
                warn!(error = %err, "could not read update dismissal");
                false
            }
        };
        let notice = UpdateNotice::new(self.force_update, previously_dismissed)
            .with_probe_interval(self.probe_interval);

        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(notice.clone());

        let driver = Driver {
            probe: Arc::clone(&self.probe),
            shell: Arc::clone(&self.shell),
            flags: Arc::clone(&self.flags),
            clock: self.clock,
            tx: tx.clone(),
        };
        let task = tokio::spawn(driver.run(notice, rx, state_tx));
        let watcher = tokio::spawn(watch_waiting_builds(self.probe.subscribe(), tx.clone()));

        let handle = UpdateHandle {
            tx,
            state: state_rx,
            task,
            watcher,
        };
        handle.send(UpdateEvent::Registered);
        handle
    }
}

/// Owner of the running update flow. Dropping it stops probing.
pub struct UpdateHandle {
    tx: mpsc::UnboundedSender<UpdateEvent>,
    state: watch::Receiver<UpdateNotice>,
    task: JoinHandle<()>,
    watcher: JoinHandle<()>,
}

impl UpdateHandle {
    /// "Refresh now".
    pub fn accept(&self) {
        self.send(UpdateEvent::Accept);
    }

    /// "Later". Ignored in force-update mode.
    pub fn dismiss(&self) {
        self.send(UpdateEvent::Dismiss);
    }

    #[must_use]
    pub fn snapshot(&self) -> UpdateNotice {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UpdateNotice> {
        self.state.clone()
    }

    fn send(&self, event: UpdateEvent) {
        if self.tx.send(event).is_err() {
            warn!("update flow already stopped");
        }
    }
}

impl Drop for UpdateHandle {
    fn drop(&mut self) {
        self.watcher.abort();
        self.task.abort();
    }
}

/// Turn waiting-build announcements into notice events. A different version
/// replacing an earlier one re-opens the notice, including after a reload.
async fn watch_waiting_builds(
    mut waiting: watch::Receiver<Option<String>>,
    tx: mpsc::UnboundedSender<UpdateEvent>,
) {
    let mut announced: Option<String> = None;
    loop {
        let current = waiting.borrow_and_update().clone();
        if let Some(version) = current {
            let event = match announced.as_deref() {
                None => Some(UpdateEvent::UpdateAvailable),
                Some(previous) if previous != version => Some(UpdateEvent::Reset),
                Some(_) => None,
            };
            if let Some(event) = event {
                info!(%version, "update available");
                if tx.send(event).is_err() {
                    return;
                }
                // After a reload nothing is pending, so a reset alone shows nothing.
                if event == UpdateEvent::Reset && tx.send(UpdateEvent::UpdateAvailable).is_err() {
                    return;
                }
                announced = Some(version);
            }
        }
        if waiting.changed().await.is_err() {
            return;
        }
    }
}

struct Driver {
    probe: Arc<dyn UpdateProbe>,
    shell: Arc<dyn AppShell>,
    flags: Arc<dyn FlagRepository>,
    clock: Clock,
    tx: mpsc::UnboundedSender<UpdateEvent>,
}

impl Driver {
    async fn run(
        self,
        mut notice: UpdateNotice,
        mut rx: mpsc::UnboundedReceiver<UpdateEvent>,
        state_tx: watch::Sender<UpdateNotice>,
    ) {
        while let Some(event) = rx.recv().await {
            for command in notice.handle_event(event) {
                self.execute(command);
            }
            state_tx.send_if_modified(|published| {
                if *published == notice {
                    false
                } else {
                    *published = notice.clone();
                    true
                }
            });
        }
    }

    fn execute(&self, command: UpdateCommand) {
        let tx = self.tx.clone();
        match command {
            UpdateCommand::PersistDismissal => {
                let flags = Arc::clone(&self.flags);
                let now = self.clock.now();
                tokio::spawn(async move {
                    if let Err(err) = flags
                        .set_flag(FlagKey::UpdateDismissed, DISMISSED_VALUE, now)
                        .await
                    {
                        warn!(error = %err, "could not store update dismissal");
                    }
                });
            }
            UpdateCommand::ClearDismissal => {
                let flags = Arc::clone(&self.flags);
                tokio::spawn(async move {
                    if let Err(err) = flags.clear_flag(FlagKey::UpdateDismissed).await {
                        warn!(error = %err, "could not clear update dismissal");
                    }
                });
            }
            UpdateCommand::HideAfter { delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(UpdateEvent::ExitTransitionElapsed);
                });
            }
            UpdateCommand::ActivateNewVersion => {
                let shell = Arc::clone(&self.shell);
                tokio::spawn(async move {
                    if let Err(err) = shell.activate_new_version().await {
                        warn!(error = %err, "activating new build failed");
                    }
                    let _ = tx.send(UpdateEvent::ActivationSettled);
                });
            }
            UpdateCommand::ReloadAfter { delay } => {
                let shell = Arc::clone(&self.shell);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    info!("reloading into new build");
                    shell.reload();
                    let _ = tx.send(UpdateEvent::Reloaded);
                });
            }
            UpdateCommand::CheckReachability => {
                let probe = Arc::clone(&self.probe);
                tokio::spawn(async move {
                    let reachable = probe.check_reachable().await;
                    if !reachable {
                        debug!("update origin unreachable, skipping check");
                    }
                    let _ = tx.send(UpdateEvent::ReachabilitySettled(reachable));
                });
            }
            UpdateCommand::CheckForUpdate => {
                let probe = Arc::clone(&self.probe);
                tokio::spawn(async move {
                    if let Err(err) = probe.check_for_update().await {
                        debug!(error = %err, "update check failed");
                    }
                    let _ = tx.send(UpdateEvent::UpdateCheckSettled);
                });
            }
            UpdateCommand::ScheduleProbe { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(UpdateEvent::ProbeDue);
                });
            }
        }
    }
}
