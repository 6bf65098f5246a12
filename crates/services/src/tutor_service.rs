//! Async driver for one tutoring session.
//!
//! The session state machine lives inside a single task. User input,
//! request results and timer expiry all arrive on one channel, so
//! transitions never interleave. Snapshots go out on a `watch` channel.
//! Dropping the [`TutorHandle`] aborts the task; work still in flight then
//! fails to report back and its result is discarded.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use learn_core::model::{ApiSettings, JobStatus};
use learn_core::polling::PollPolicy;
use learn_core::tutor::{TutorCommand, TutorEvent, TutorSession};

use crate::Clock;
use crate::api::TutorApi;

/// What the view layer observes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TutorSnapshot {
    pub session: TutorSession,
    /// Bumped each time the input should take focus.
    pub focus_requests: u64,
}

enum DriverMessage {
    Event(TutorEvent),
    FocusDue,
}

/// Starts tutoring sessions against a backend.
#[derive(Clone)]
pub struct TutorSessionService {
    api: Arc<dyn TutorApi>,
    settings: ApiSettings,
    clock: Clock,
    policy: PollPolicy,
}

impl TutorSessionService {
    #[must_use]
    pub fn new(api: Arc<dyn TutorApi>, settings: ApiSettings, clock: Clock) -> Self {
        Self {
            api,
            settings,
            clock,
            policy: PollPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Spawn the session task and mount it. Must run inside a tokio runtime.
    #[must_use]
    pub fn start(&self) -> TutorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = TutorSession::new(self.policy);
        let (state_tx, state_rx) = watch::channel(TutorSnapshot {
            session: session.clone(),
            focus_requests: 0,
        });

        let driver = Driver {
            api: Arc::clone(&self.api),
            settings: self.settings.clone(),
            clock: self.clock,
            started: Instant::now(),
            tx: tx.clone(),
        };
        let task = tokio::spawn(driver.run(session, rx, state_tx));

        let handle = TutorHandle {
            tx,
            state: state_rx,
            task,
        };
        handle.send(TutorEvent::Mounted);
        handle
    }
}

/// Owner of a running session. Dropping it ends the session.
pub struct TutorHandle {
    tx: mpsc::UnboundedSender<DriverMessage>,
    state: watch::Receiver<TutorSnapshot>,
    task: JoinHandle<()>,
}

impl TutorHandle {
    /// Re-announce mount; the session ignores repeats.
    pub fn mount(&self) {
        self.send(TutorEvent::Mounted);
    }

    pub fn submit(&self, text: impl Into<String>) {
        self.send(TutorEvent::Submit(text.into()));
    }

    pub fn retry(&self) {
        self.send(TutorEvent::Retry);
    }

    pub fn retry_follow_up(&self) {
        self.send(TutorEvent::RetryFollowUp);
    }

    #[must_use]
    pub fn snapshot(&self) -> TutorSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TutorSnapshot> {
        self.state.clone()
    }

    fn send(&self, event: TutorEvent) {
        if self.tx.send(DriverMessage::Event(event)).is_err() {
            warn!("tutor session already stopped");
        }
    }
}

impl Drop for TutorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Driver {
    api: Arc<dyn TutorApi>,
    settings: ApiSettings,
    clock: Clock,
    /// Session start on the runtime's clock; a fixed `clock` follows it.
    started: Instant,
    tx: mpsc::UnboundedSender<DriverMessage>,
}

impl Driver {
    async fn run(
        self,
        mut session: TutorSession,
        mut rx: mpsc::UnboundedReceiver<DriverMessage>,
        state_tx: watch::Sender<TutorSnapshot>,
    ) {
        while let Some(message) = rx.recv().await {
            let commands = match message {
                DriverMessage::Event(event) => {
                    let clock = self.clock.advanced_by(self.started.elapsed());
                    session.handle_event(event, clock.now())
                }
                DriverMessage::FocusDue => {
                    state_tx.send_modify(|snapshot| snapshot.focus_requests += 1);
                    continue;
                }
            };
            for command in commands {
                self.execute(command);
            }
            state_tx.send_if_modified(|snapshot| {
                if snapshot.session == session {
                    false
                } else {
                    snapshot.session = session.clone();
                    true
                }
            });
        }
    }

    fn execute(&self, command: TutorCommand) {
        let tx = self.tx.clone();
        match command {
            TutorCommand::SubmitTeachingJob => {
                let api = Arc::clone(&self.api);
                let topic_id = self.settings.topic_id();
                let user_id = self.settings.user_id().clone();
                tokio::spawn(async move {
                    let event = match api.submit_teaching_job(topic_id, &user_id).await {
                        Ok(job) => {
                            info!(job_id = %job.job_id, "teaching job created");
                            TutorEvent::JobCreated(job)
                        }
                        Err(err) => {
                            warn!(error = %err, "teaching job request failed");
                            TutorEvent::JobCreationFailed(err.into_failure())
                        }
                    };
                    let _ = tx.send(DriverMessage::Event(event));
                });
            }
            TutorCommand::SchedulePoll { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(DriverMessage::Event(TutorEvent::PollDue));
                });
            }
            TutorCommand::PollJob { job_id } => {
                let api = Arc::clone(&self.api);
                tokio::spawn(async move {
                    let result = api.poll_job(&job_id).await.map_err(|err| {
                        warn!(job_id = %job_id, error = %err, "poll request failed");
                        err.into_failure()
                    });
                    if matches!(result, Ok(JobStatus::Ready(_))) {
                        info!(job_id = %job_id, "lesson ready");
                    }
                    let _ = tx.send(DriverMessage::Event(TutorEvent::PollSettled(result)));
                });
            }
            TutorCommand::AskFollowUp {
                question,
                conversation_id,
            } => {
                let api = Arc::clone(&self.api);
                let user_id = self.settings.user_id().clone();
                tokio::spawn(async move {
                    let result = api
                        .ask_follow_up(&question, &conversation_id, &user_id)
                        .await
                        .map_err(|err| {
                            warn!(error = %err, "follow-up request failed");
                            err.into_failure()
                        });
                    let _ = tx.send(DriverMessage::Event(TutorEvent::FollowUpSettled(result)));
                });
            }
            TutorCommand::FocusInput { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(DriverMessage::FocusDue);
                });
            }
        }
    }
}
