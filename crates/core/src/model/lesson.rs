use serde::{Deserialize, Serialize};

use crate::model::{ConversationId, JobId};

/// Structured lesson produced by a completed teaching job.
///
/// Field names follow the backend's camelCase JSON. List fields default to
/// empty when the backend omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingContent {
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_units: Option<u32>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub syllabus_reference: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub worked_examples: Vec<String>,
    #[serde(default)]
    pub practical_applications: Vec<String>,
    #[serde(default)]
    pub syllabus_coverage: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

impl TeachingContent {
    /// A job result counts as populated once the course title is filled in.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        !self.course_title.trim().is_empty()
    }

    /// Header line shown above the lesson, e.g. `"MTH101: Calculus I"`.
    #[must_use]
    pub fn heading(&self) -> String {
        if self.course_code.is_empty() {
            self.course_title.clone()
        } else {
            format!("{}: {}", self.course_code, self.course_title)
        }
    }
}

/// Answer to a follow-up question asked in the context of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpAnswer {
    pub answer: String,
}

impl FollowUpAnswer {
    #[must_use]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

/// Handle returned when a teaching job is accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingJob {
    pub job_id: JobId,
    pub conversation_id: ConversationId,
}

/// Observation of a teaching job while it is being polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Ready(TeachingContent),
}

impl JobStatus {
    /// Classify a raw payload: anything without a course title is still pending.
    #[must_use]
    pub fn from_payload(payload: Option<TeachingContent>) -> Self {
        match payload {
            Some(content) if content.is_populated() => JobStatus::Ready(content),
            _ => JobStatus::Pending,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_content(topic: &str) -> TeachingContent {
    TeachingContent {
        course_code: "MTH101".into(),
        course_title: "Elementary Mathematics".into(),
        level: Some(100),
        credit_units: Some(3),
        topic: topic.into(),
        syllabus_reference: "1.2".into(),
        explanation: "A limit describes the value a function approaches.".into(),
        key_concepts: vec!["limit".into(), "continuity".into()],
        worked_examples: vec!["lim x->2 of x^2 = 4".into()],
        practical_applications: vec!["instantaneous velocity".into()],
        syllabus_coverage: vec!["limits".into()],
        follow_up_questions: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_payload_with_missing_lists() {
        let raw = r#"{
            "courseCode": "PHY102",
            "courseTitle": "General Physics II",
            "topic": "Electric fields",
            "explanation": "Fields exert force on charges."
        }"#;
        let content: TeachingContent = serde_json::from_str(raw).unwrap();
        assert_eq!(content.heading(), "PHY102: General Physics II");
        assert!(content.worked_examples.is_empty());
        assert!(content.level.is_none());
        assert!(content.is_populated());
    }

    #[test]
    fn blank_course_title_is_pending() {
        let mut content = sample_content("Limits");
        content.course_title = "  ".into();
        assert_eq!(JobStatus::from_payload(Some(content)), JobStatus::Pending);
        assert_eq!(JobStatus::from_payload(None), JobStatus::Pending);
    }

    #[test]
    fn populated_payload_is_ready() {
        let content = sample_content("Limits");
        assert_eq!(
            JobStatus::from_payload(Some(content.clone())),
            JobStatus::Ready(content)
        );
    }

    #[test]
    fn teaching_job_reads_camel_case() {
        let job: TeachingJob =
            serde_json::from_str(r#"{"jobId":"J1","conversationId":"C1"}"#).unwrap();
        assert_eq!(job.job_id, JobId::new("J1"));
        assert_eq!(job.conversation_id, ConversationId::new("C1"));
    }
}
