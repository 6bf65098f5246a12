//! Tutoring backend contract and its HTTP implementation.

mod envelope;
mod http;

use async_trait::async_trait;

use learn_core::model::{
    ConversationId, FollowUpAnswer, JobId, JobStatus, TeachingJob, TopicId, UserId,
};

use crate::error::ApiError;

pub use http::HttpTutorApi;

/// Requests the tutor session needs from the backend.
#[async_trait]
pub trait TutorApi: Send + Sync {
    /// Start lesson generation for a topic.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the request fails or the backend refuses it.
    async fn submit_teaching_job(
        &self,
        topic_id: TopicId,
        user_id: &UserId,
    ) -> Result<TeachingJob, ApiError>;

    /// Fetch the current state of a generation job.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the request fails or the backend refuses it.
    async fn poll_job(&self, job_id: &JobId) -> Result<JobStatus, ApiError>;

    /// Ask a question in the context of an existing conversation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the request fails or the backend refuses it.
    async fn ask_follow_up(
        &self,
        question: &str,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<FollowUpAnswer, ApiError>;
}
