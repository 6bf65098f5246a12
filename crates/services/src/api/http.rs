use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use learn_core::model::{
    ApiSettings, ConversationId, FollowUpAnswer, JobId, JobStatus, TeachingContent, TeachingJob,
    TopicId, UserId,
};

use super::TutorApi;
use super::envelope::{decode, decode_required};
use crate::error::ApiError;

/// `TutorApi` over the backend's JSON endpoints.
#[derive(Clone)]
pub struct HttpTutorApi {
    client: Client,
    settings: ApiSettings,
}

impl HttpTutorApi {
    #[must_use]
    pub fn new(settings: ApiSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    #[must_use]
    pub fn with_client(client: Client, settings: ApiSettings) -> Self {
        Self { client, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    async fn read(response: reqwest::Response) -> Result<(reqwest::StatusCode, String), ApiError> {
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl TutorApi for HttpTutorApi {
    async fn submit_teaching_job(
        &self,
        topic_id: TopicId,
        user_id: &UserId,
    ) -> Result<TeachingJob, ApiError> {
        let payload = TeachRequest {
            topic_id: topic_id.to_string(),
            user_id: user_id.as_str(),
        };
        let response = self
            .client
            .post(self.settings.endpoint("/agent/teach"))
            .json(&payload)
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        decode_required(status, &body)
    }

    async fn poll_job(&self, job_id: &JobId) -> Result<JobStatus, ApiError> {
        let path = format!("/agent/exercise-queue/{}", job_id.as_str());
        let response = self.client.get(self.settings.endpoint(&path)).send().await?;
        let (status, body) = Self::read(response).await?;
        let payload: Option<TeachingContent> = decode(status, &body)?;
        let job_status = JobStatus::from_payload(payload);
        debug!(
            job_id = job_id.as_str(),
            ready = matches!(job_status, JobStatus::Ready(_)),
            "polled teaching job"
        );
        Ok(job_status)
    }

    async fn ask_follow_up(
        &self,
        question: &str,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<FollowUpAnswer, ApiError> {
        let payload = AskRequest {
            question,
            conversation_id: conversation_id.as_str(),
            user_id: user_id.as_str(),
        };
        let response = self
            .client
            .post(self.settings.endpoint("/agent/ask"))
            .json(&payload)
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        decode_required(status, &body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeachRequest<'a> {
    topic_id: String,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest<'a> {
    question: &'a str,
    conversation_id: &'a str,
    user_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_bodies_use_camel_case() {
        let teach = TeachRequest {
            topic_id: "64f572ac-03e3-42d2-b81e-0baf063738b7".into(),
            user_id: "student-1",
        };
        assert_eq!(
            serde_json::to_value(&teach).unwrap(),
            serde_json::json!({
                "topicId": "64f572ac-03e3-42d2-b81e-0baf063738b7",
                "userId": "student-1"
            })
        );

        let ask = AskRequest {
            question: "Why?",
            conversation_id: "c1",
            user_id: "student-1",
        };
        assert_eq!(
            serde_json::to_value(&ask).unwrap(),
            serde_json::json!({
                "question": "Why?",
                "conversationId": "c1",
                "userId": "student-1"
            })
        );
    }
}
