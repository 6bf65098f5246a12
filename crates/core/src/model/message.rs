use chrono::{DateTime, Utc};

use crate::model::{FollowUpAnswer, MessageId, TeachingContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Structured body of an assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    /// The initial lesson, delivered once per session.
    Teaching(TeachingContent),
    /// An answer to a follow-up question.
    FollowUp(FollowUpAnswer),
}

/// A single transcript entry. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: Option<String>,
    payload: Option<MessagePayload>,
    timestamp: DateTime<Utc>,
}

impl Message {
    #[must_use]
    pub fn user(id: MessageId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::User,
            content: Some(content.into()),
            payload: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn assistant(id: MessageId, payload: MessagePayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: None,
            payload: Some(payload),
            timestamp,
        }
    }

    /// Assistant message carrying plain text, used when no structured body exists.
    #[must_use]
    pub fn assistant_text(
        id: MessageId,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: Some(content.into()),
            payload: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&MessagePayload> {
        self.payload.as_ref()
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn teaching(&self) -> Option<&TeachingContent> {
        match self.payload.as_ref() {
            Some(MessagePayload::Teaching(content)) => Some(content),
            _ => None,
        }
    }

    /// Plain text to display for this message, whichever shape it carries.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match (self.content.as_deref(), self.payload.as_ref()) {
            (Some(text), _) => text,
            (None, Some(MessagePayload::FollowUp(answer))) => &answer.answer,
            (None, Some(MessagePayload::Teaching(content))) => &content.explanation,
            (None, None) => "",
        }
    }
}
