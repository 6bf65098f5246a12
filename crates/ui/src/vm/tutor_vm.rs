use learn_core::model::{Message, MessagePayload, Role, TeachingContent};
use learn_core::tutor::{SessionPhase, TutorSession};

use super::markdown_vm::{inline_markdown_to_html, markdown_to_html};
use super::time_fmt::format_message_time;

pub const LOADING_TITLE: &str = "Preparing your lesson…";
pub const LOADING_TOPIC_FALLBACK: &str = "Loading topic…";
pub const ERROR_TITLE: &str = "Something went wrong";
pub const RETRY_LABEL: &str = "Retry";
pub const TYPING_TEXT: &str = "AI is thinking...";
pub const QUICK_ACTIONS_LABEL: &str = "Quick actions:";
pub const LOCK_HINT: &str = "Read the lesson first — your input will unlock shortly";
pub const LOCKED_PLACEHOLDER: &str = "Waiting for your lesson…";
pub const DEFAULT_PLACEHOLDER: &str = "Ask a question or request help...";
pub const DISCLAIMER: &str =
    "The AI tutor provides explanations but won't complete assignments for you";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorVm {
    pub title: &'static str,
    pub message: String,
    pub code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusPanel {
    None,
    Loading { topic: String },
    Failed(ErrorVm),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonVm {
    pub heading: String,
    pub topic: String,
    pub level_label: Option<String>,
    pub explanation_html: String,
    pub key_concepts_html: Vec<String>,
    pub worked_examples_html: Vec<String>,
    pub practical_applications_html: Vec<String>,
    pub syllabus_reference: Option<String>,
    pub syllabus_coverage: Vec<String>,
}

impl LessonVm {
    #[must_use]
    pub fn from_content(content: &TeachingContent) -> Self {
        let render_all =
            |items: &[String]| items.iter().map(|item| inline_markdown_to_html(item)).collect();
        let syllabus_reference = Some(content.syllabus_reference.trim().to_string())
            .filter(|reference| !reference.is_empty());
        Self {
            heading: content.heading(),
            topic: content.topic.clone(),
            level_label: content.level.map(|level| format!("Level {level}")),
            explanation_html: markdown_to_html(&content.explanation),
            key_concepts_html: render_all(&content.key_concepts),
            worked_examples_html: render_all(&content.worked_examples),
            practical_applications_html: render_all(&content.practical_applications),
            syllabus_reference,
            syllabus_coverage: content.syllabus_coverage.clone(),
        }
    }

    #[must_use]
    pub fn worked_examples_title(&self) -> String {
        format!("Worked Examples ({})", self.worked_examples_html.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Lesson(Box<LessonVm>),
    Answer { html: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageVm {
    pub id: u64,
    pub from_student: bool,
    pub body: MessageBody,
    pub time_label: String,
}

impl MessageVm {
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        let body = match (message.role(), message.payload()) {
            (Role::Assistant, Some(MessagePayload::Teaching(content))) => {
                MessageBody::Lesson(Box::new(LessonVm::from_content(content)))
            }
            (Role::Assistant, Some(MessagePayload::FollowUp(answer))) => MessageBody::Answer {
                html: markdown_to_html(&answer.answer),
            },
            _ => MessageBody::Text(message.display_text().to_string()),
        };
        Self {
            id: message.id().value(),
            from_student: message.role() == Role::User,
            body,
            time_label: format_message_time(message.timestamp()),
        }
    }
}

/// A follow-up that failed, offered for another try.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowUpErrorVm {
    pub message: String,
    pub question: String,
}

/// Everything the tutor page renders, derived from the session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorVm {
    pub status: StatusPanel,
    pub messages: Vec<MessageVm>,
    pub show_typing: bool,
    pub unlock_nudge: Option<String>,
    pub quick_actions: Vec<String>,
    pub follow_up_error: Option<FollowUpErrorVm>,
    pub input_locked: bool,
    pub input_disabled: bool,
    pub lock_hint: Option<&'static str>,
    pub placeholder: String,
}

impl TutorVm {
    /// Whether the send button is enabled for the current draft.
    #[must_use]
    pub fn can_send(&self, draft: &str) -> bool {
        !draft.trim().is_empty() && !self.input_disabled
    }
}

#[must_use]
pub fn map_tutor_session(session: &TutorSession) -> TutorVm {
    let status = match session.phase() {
        SessionPhase::Loading => StatusPanel::Loading {
            topic: session
                .topic()
                .unwrap_or(LOADING_TOPIC_FALLBACK)
                .to_string(),
        },
        SessionPhase::Error => StatusPanel::Failed(
            session
                .failure()
                .map_or_else(
                    || ErrorVm {
                        title: ERROR_TITLE,
                        message: "Please try again.".into(),
                        code: None,
                    },
                    |failure| ErrorVm {
                        title: ERROR_TITLE,
                        message: failure.error.message.clone(),
                        code: Some(failure.error.code.clone()).filter(|code| !code.is_empty()),
                    },
                ),
        ),
        SessionPhase::Teaching | SessionPhase::Chat => StatusPanel::None,
    };

    let in_teaching = session.phase() == SessionPhase::Teaching;
    let topic = session.topic().unwrap_or_default();
    let unlock_nudge = (in_teaching && session.teaching_content().is_some())
        .then(|| format!("You're all set — ask me anything about {topic} below"));
    let quick_actions = if in_teaching {
        session.follow_up_suggestions().to_vec()
    } else {
        Vec::new()
    };

    let input_locked = session.is_input_locked();
    let placeholder = if input_locked {
        LOCKED_PLACEHOLDER.to_string()
    } else if session.teaching_content().is_some() {
        format!("Ask me anything about {topic}…")
    } else {
        DEFAULT_PLACEHOLDER.to_string()
    };

    TutorVm {
        status,
        messages: session.messages().iter().map(MessageVm::from_message).collect(),
        show_typing: session.is_typing(),
        unlock_nudge,
        quick_actions,
        follow_up_error: session.follow_up_error().map(|failed| FollowUpErrorVm {
            message: failed.error.message.clone(),
            question: failed.question.clone(),
        }),
        input_locked,
        input_disabled: !session.can_submit(),
        lock_hint: input_locked.then_some(LOCK_HINT),
        placeholder,
    }
}
