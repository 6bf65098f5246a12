mod app_settings;
mod ids;
mod lesson;
mod message;

pub use app_settings::{ApiSettings, ApiSettingsDraft, ApiSettingsError};
pub use ids::{ConversationId, JobId, MessageId, ParseIdError, TopicId, UserId};
pub use lesson::{FollowUpAnswer, JobStatus, TeachingContent, TeachingJob};
pub use message::{Message, MessagePayload, Role};

#[cfg(test)]
pub(crate) use lesson::sample_content;
