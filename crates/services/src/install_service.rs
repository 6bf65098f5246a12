//! Driver for the deferred install banner.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use learn_core::install::{InstallCommand, InstallEvent, InstallPrompt};
use storage::repository::{FlagKey, FlagRepository};

use crate::Clock;
use crate::platform::InstallHost;

#[derive(Clone)]
pub struct InstallService {
    host: Arc<dyn InstallHost>,
    flags: Arc<dyn FlagRepository>,
    clock: Clock,
}

impl InstallService {
    /// `flags` must be the local (persistent) store.
    #[must_use]
    pub fn new(host: Arc<dyn InstallHost>, flags: Arc<dyn FlagRepository>, clock: Clock) -> Self {
        Self { host, flags, clock }
    }

    /// Load the stored dismissal and start the banner. Must run inside a
    /// tokio runtime.
    pub async fn start(&self) -> InstallHandle {
        let previously_dismissed = match self.flags.get_flag(FlagKey::InstallDismissed).await {
            Ok(record) => record.is_some(),
            Err(err) => {
                warn!(error = %err, "could not read install dismissal");
                false
            }
        };
        let prompt = InstallPrompt::new(
            self.host.platform(),
            self.host.is_standalone(),
            previously_dismissed,
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(prompt.clone());
        let driver = Driver {
            host: Arc::clone(&self.host),
            flags: Arc::clone(&self.flags),
            clock: self.clock,
            tx: tx.clone(),
        };
        let task = tokio::spawn(driver.run(prompt, rx, state_tx));
        let watcher = tokio::spawn(watch_availability(
            self.host.subscribe_available(),
            tx.clone(),
        ));

        let handle = InstallHandle {
            tx,
            state: state_rx,
            task,
            watcher,
        };
        handle.send(InstallEvent::Mounted);
        handle
    }
}

pub struct InstallHandle {
    tx: mpsc::UnboundedSender<InstallEvent>,
    state: watch::Receiver<InstallPrompt>,
    task: JoinHandle<()>,
    watcher: JoinHandle<()>,
}

impl InstallHandle {
    /// "Install app".
    pub fn install(&self) {
        self.send(InstallEvent::Install);
    }

    /// "Not now" or "Got it".
    pub fn dismiss(&self) {
        self.send(InstallEvent::Dismiss);
    }

    #[must_use]
    pub fn snapshot(&self) -> InstallPrompt {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<InstallPrompt> {
        self.state.clone()
    }

    fn send(&self, event: InstallEvent) {
        if self.tx.send(event).is_err() {
            warn!("install banner already stopped");
        }
    }
}

impl Drop for InstallHandle {
    fn drop(&mut self) {
        self.watcher.abort();
        self.task.abort();
    }
}

async fn watch_availability(
    mut available: watch::Receiver<bool>,
    tx: mpsc::UnboundedSender<InstallEvent>,
) {
    loop {
        if *available.borrow_and_update() {
            let _ = tx.send(InstallEvent::InstallAvailable);
            return;
        }
        if available.changed().await.is_err() {
            return;
        }
    }
}

struct Driver {
    host: Arc<dyn InstallHost>,
    flags: Arc<dyn FlagRepository>,
    clock: Clock,
    tx: mpsc::UnboundedSender<InstallEvent>,
}

impl Driver {
    async fn run(
        self,
        mut prompt: InstallPrompt,
        mut rx: mpsc::UnboundedReceiver<InstallEvent>,
        state_tx: watch::Sender<InstallPrompt>,
    ) {
        while let Some(event) = rx.recv().await {
            for command in prompt.handle_event(event, self.clock.now()) {
                self.execute(command);
            }
            state_tx.send_if_modified(|published| {
                if *published == prompt {
                    false
                } else {
                    *published = prompt.clone();
                    true
                }
            });
        }
    }

    fn execute(&self, command: InstallCommand) {
        let tx = self.tx.clone();
        match command {
            InstallCommand::ShowAfter { delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(InstallEvent::ShowDue);
                });
            }
            InstallCommand::PromptNative => {
                let host = Arc::clone(&self.host);
                tokio::spawn(async move {
                    let accepted = host.prompt_install().await;
                    info!(accepted, "install prompt answered");
                    let _ = tx.send(InstallEvent::InstallChoiceSettled);
                });
            }
            InstallCommand::PersistDismissal { at } => {
                let flags = Arc::clone(&self.flags);
                tokio::spawn(async move {
                    let marker = at.timestamp_millis().to_string();
                    if let Err(err) = flags.set_flag(FlagKey::InstallDismissed, &marker, at).await {
                        warn!(error = %err, "could not store install dismissal");
                    }
                });
            }
            InstallCommand::CloseAfter { delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(InstallEvent::CloseDue);
                });
            }
        }
    }
}
