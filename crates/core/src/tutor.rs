//! Tutoring session controller.
//!
//! `TutorSession` is a synchronous state machine. The caller feeds it
//! [`TutorEvent`]s (mount, request results, timer expiry, user input) together
//! with the current time, and executes the [`TutorCommand`]s it returns.
//! Nothing in here performs I/O or sleeps, so every transition is testable
//! with a fixed clock.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ApiFailure;
use crate::model::{
    ConversationId, FollowUpAnswer, JobId, JobStatus, Message, MessageId, MessagePayload,
    TeachingContent, TeachingJob,
};
use crate::polling::PollPolicy;
use crate::suggestions::follow_up_suggestions;
use crate::time::elapsed_between;

/// Delay before focusing the input after the lesson appears.
pub const INPUT_FOCUS_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Teaching,
    Chat,
    Error,
}

/// The pipeline step that put the session into `SessionPhase::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    Generation,
    Poll,
    PollTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub step: FailedStep,
    pub error: ApiFailure,
}

/// A follow-up question whose request failed; kept so it can be re-asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpFailure {
    pub question: String,
    pub error: ApiFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorEvent {
    /// The tutor page was mounted (may repeat on re-render).
    Mounted,
    JobCreated(TeachingJob),
    JobCreationFailed(ApiFailure),
    /// A previously scheduled poll timer fired.
    PollDue,
    PollSettled(Result<JobStatus, ApiFailure>),
    /// The student submitted text (typed or a quick action).
    Submit(String),
    FollowUpSettled(Result<FollowUpAnswer, ApiFailure>),
    /// Retry the step that failed the session.
    Retry,
    /// Re-ask the last follow-up question that failed.
    RetryFollowUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorCommand {
    SubmitTeachingJob,
    SchedulePoll {
        after: Duration,
    },
    PollJob {
        job_id: JobId,
    },
    AskFollowUp {
        question: String,
        conversation_id: ConversationId,
    },
    FocusInput {
        after: Duration,
    },
}

/// State of one Mini Tutor session, from page entry to navigation away.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorSession {
    policy: PollPolicy,
    phase: SessionPhase,
    generation_requested: bool,
    generation_in_flight: bool,
    job_id: Option<JobId>,
    conversation_id: Option<ConversationId>,
    first_observed_at: Option<DateTime<Utc>>,
    wait_started_at: Option<DateTime<Utc>>,
    poll_scheduled: bool,
    poll_in_flight: bool,
    result_seen: bool,
    messages: Vec<Message>,
    next_message_id: u64,
    topic: Option<String>,
    follow_up_suggestions: Vec<String>,
    typing: bool,
    failure: Option<SessionFailure>,
    follow_up_error: Option<FollowUpFailure>,
}

impl Default for TutorSession {
    fn default() -> Self {
        Self::new(PollPolicy::default())
    }
}

impl TutorSession {
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            phase: SessionPhase::Loading,
            generation_requested: false,
            generation_in_flight: false,
            job_id: None,
            conversation_id: None,
            first_observed_at: None,
            wait_started_at: None,
            poll_scheduled: false,
            poll_in_flight: false,
            result_seen: false,
            messages: Vec::new(),
            next_message_id: 1,
            topic: None,
            follow_up_suggestions: Vec::new(),
            typing: false,
            failure: None,
            follow_up_error: None,
        }
    }

    /// Apply one event and return the side effects the caller must run.
    pub fn handle_event(&mut self, event: TutorEvent, now: DateTime<Utc>) -> Vec<TutorCommand> {
        match event {
            TutorEvent::Mounted => self.on_mounted(),
            TutorEvent::JobCreated(job) => self.on_job_created(job, now),
            TutorEvent::JobCreationFailed(error) => self.on_job_creation_failed(error),
            TutorEvent::PollDue => self.on_poll_due(),
            TutorEvent::PollSettled(result) => self.on_poll_settled(result, now),
            TutorEvent::Submit(text) => self.on_submit(&text, now),
            TutorEvent::FollowUpSettled(result) => self.on_follow_up_settled(result, now),
            TutorEvent::Retry => self.on_retry(now),
            TutorEvent::RetryFollowUp => self.on_retry_follow_up(),
        }
    }

    fn on_mounted(&mut self) -> Vec<TutorCommand> {
        if self.generation_requested {
            return Vec::new();
        }
        self.generation_requested = true;
        self.generation_in_flight = true;
        vec![TutorCommand::SubmitTeachingJob]
    }

    fn on_job_created(&mut self, job: TeachingJob, now: DateTime<Utc>) -> Vec<TutorCommand> {
        if !self.generation_in_flight {
            return Vec::new();
        }
        self.generation_in_flight = false;
        self.job_id = Some(job.job_id);
        self.conversation_id = Some(job.conversation_id);
        self.first_observed_at = Some(now);
        self.wait_started_at = Some(now);
        self.poll_scheduled = true;
        vec![TutorCommand::SchedulePoll {
            after: self.policy.next_poll_delay(Duration::ZERO),
        }]
    }

    fn on_job_creation_failed(&mut self, error: ApiFailure) -> Vec<TutorCommand> {
        if !self.generation_in_flight {
            return Vec::new();
        }
        self.generation_in_flight = false;
        self.fail(FailedStep::Generation, error);
        Vec::new()
    }

    fn on_poll_due(&mut self) -> Vec<TutorCommand> {
        if !self.poll_scheduled || self.poll_in_flight || self.result_seen {
            return Vec::new();
        }
        self.poll_scheduled = false;
        let Some(job_id) = self.job_id.clone() else {
            return Vec::new();
        };
        self.poll_in_flight = true;
        vec![TutorCommand::PollJob { job_id }]
    }

    fn on_poll_settled(
        &mut self,
        result: Result<JobStatus, ApiFailure>,
        now: DateTime<Utc>,
    ) -> Vec<TutorCommand> {
        if !self.poll_in_flight {
            return Vec::new();
        }
        self.poll_in_flight = false;

        match result {
            Ok(JobStatus::Ready(content)) => self.deliver_lesson(content, now),
            Ok(JobStatus::Pending) => {
                let waited = self
                    .wait_started_at
                    .map_or(Duration::ZERO, |at| elapsed_between(at, now));
                if self.policy.has_expired(waited) {
                    self.fail(
                        FailedStep::PollTimeout,
                        ApiFailure::new(
                            "poll_timeout",
                            "Your lesson is taking longer than expected.",
                        ),
                    );
                    return Vec::new();
                }
                let since_first = self
                    .first_observed_at
                    .map_or(Duration::ZERO, |at| elapsed_between(at, now));
                self.poll_scheduled = true;
                vec![TutorCommand::SchedulePoll {
                    after: self.policy.next_poll_delay(since_first),
                }]
            }
            Err(error) => {
                self.fail(FailedStep::Poll, error);
                Vec::new()
            }
        }
    }

    fn deliver_lesson(&mut self, content: TeachingContent, now: DateTime<Utc>) -> Vec<TutorCommand> {
        self.result_seen = true;
        self.poll_scheduled = false;
        self.topic = Some(content.topic.clone());
        self.follow_up_suggestions = follow_up_suggestions(&content);
        let id = self.allocate_id();
        self.messages = vec![Message::assistant(
            id,
            MessagePayload::Teaching(content),
            now,
        )];
        self.phase = SessionPhase::Teaching;
        self.failure = None;
        vec![TutorCommand::FocusInput {
            after: INPUT_FOCUS_DELAY,
        }]
    }

    fn on_submit(&mut self, text: &str, now: DateTime<Utc>) -> Vec<TutorCommand> {
        let question = text.trim();
        if question.is_empty() || !self.can_submit() {
            return Vec::new();
        }
        let Some(conversation_id) = self.conversation_id.clone() else {
            return Vec::new();
        };

        if self.phase == SessionPhase::Teaching {
            self.phase = SessionPhase::Chat;
        }
        let id = self.allocate_id();
        self.messages.push(Message::user(id, question, now));
        self.follow_up_error = None;
        self.typing = true;

        vec![TutorCommand::AskFollowUp {
            question: question.to_string(),
            conversation_id,
        }]
    }

    fn on_follow_up_settled(
        &mut self,
        result: Result<FollowUpAnswer, ApiFailure>,
        now: DateTime<Utc>,
    ) -> Vec<TutorCommand> {
        if !self.typing {
            return Vec::new();
        }
        self.typing = false;

        match result {
            Ok(answer) => {
                let id = self.allocate_id();
                self.messages.push(Message::assistant(
                    id,
                    MessagePayload::FollowUp(answer),
                    now,
                ));
            }
            Err(error) => {
                let question = self
                    .last_user_question()
                    .unwrap_or_default()
                    .to_string();
                self.follow_up_error = Some(FollowUpFailure { question, error });
            }
        }
        Vec::new()
    }

    fn on_retry(&mut self, now: DateTime<Utc>) -> Vec<TutorCommand> {
        if self.phase != SessionPhase::Error {
            return Vec::new();
        }
        let Some(failure) = self.failure.take() else {
            return Vec::new();
        };
        self.phase = SessionPhase::Loading;

        match failure.step {
            FailedStep::Generation => {
                self.job_id = None;
                self.conversation_id = None;
                self.first_observed_at = None;
                self.wait_started_at = None;
                self.poll_scheduled = false;
                self.generation_in_flight = true;
                vec![TutorCommand::SubmitTeachingJob]
            }
            FailedStep::Poll | FailedStep::PollTimeout => {
                let Some(job_id) = self.job_id.clone() else {
                    self.generation_in_flight = true;
                    return vec![TutorCommand::SubmitTeachingJob];
                };
                self.wait_started_at = Some(now);
                self.poll_scheduled = false;
                self.poll_in_flight = true;
                vec![TutorCommand::PollJob { job_id }]
            }
        }
    }

    fn on_retry_follow_up(&mut self) -> Vec<TutorCommand> {
        if self.typing || self.is_generating() {
            return Vec::new();
        }
        let Some(conversation_id) = self.conversation_id.clone() else {
            return Vec::new();
        };
        let Some(failed) = self.follow_up_error.take() else {
            return Vec::new();
        };
        self.typing = true;
        vec![TutorCommand::AskFollowUp {
            question: failed.question,
            conversation_id,
        }]
    }

    fn fail(&mut self, step: FailedStep, error: ApiFailure) {
        self.phase = SessionPhase::Error;
        self.poll_scheduled = false;
        self.failure = Some(SessionFailure { step, error });
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    fn last_user_question(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|msg| msg.role() == crate::model::Role::User)
            .and_then(Message::content)
    }

    // ─── Derived state ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    #[must_use]
    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    #[must_use]
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn follow_up_suggestions(&self) -> &[String] {
        &self.follow_up_suggestions
    }

    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn follow_up_error(&self) -> Option<&FollowUpFailure> {
        self.follow_up_error.as_ref()
    }

    /// True while the job is being created or a poll request is outstanding.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.generation_in_flight || self.poll_in_flight
    }

    #[must_use]
    pub fn is_input_locked(&self) -> bool {
        self.phase == SessionPhase::Loading || self.is_generating()
    }

    /// Whether a submission would currently be accepted.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, SessionPhase::Teaching | SessionPhase::Chat)
            && !self.is_input_locked()
            && !self.typing
            && self.conversation_id.is_some()
    }

    /// The lesson delivered for this session, if it has arrived.
    #[must_use]
    pub fn teaching_content(&self) -> Option<&TeachingContent> {
        self.messages.iter().find_map(Message::teaching)
    }
}
