use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use learn_core::ApiFailure;

use crate::error::ApiError;

const UNKNOWN_ERROR_CODE: &str = "unknown_error";
const UNKNOWN_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Every backend response is wrapped as `{ success, message, data, error? }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<EnvelopeMessage>,
    data: Option<T>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvelopeMessage {
    Text(String),
    List(Vec<String>),
}

impl EnvelopeMessage {
    fn into_text(self) -> String {
        match self {
            EnvelopeMessage::Text(text) => text,
            EnvelopeMessage::List(parts) => parts.join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    code: String,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<Option<T>, ApiFailure> {
        if self.success {
            return Ok(self.data);
        }
        let code = self
            .error
            .map(|err| err.code)
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string());
        let message = self
            .message
            .map(EnvelopeMessage::into_text)
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        Err(ApiFailure::new(code, message))
    }
}

/// Unwrap a response body. A failure envelope wins over the HTTP status so
/// the student sees the backend's message; other non-2xx bodies surface the
/// status.
pub(crate) fn decode<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ApiError> {
    if !status.is_success() {
        return match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
            Ok(envelope) if !envelope.success => match envelope.into_result() {
                Err(failure) => Err(ApiError::Api(failure)),
                Ok(_) => Err(ApiError::HttpStatus(status)),
            },
            _ => Err(ApiError::HttpStatus(status)),
        };
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(envelope.into_result()?)
}

/// Like [`decode`], but the payload must be present.
pub(crate) fn decode_required<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, ApiError> {
    decode(status, body)?.ok_or_else(|| ApiError::Decode("response data is missing".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::{JobStatus, TeachingContent, TeachingJob};

    #[test]
    fn success_envelope_yields_data() {
        let body = r#"{"success":true,"message":"ok","data":{"jobId":"j1","conversationId":"c1"}}"#;
        let job: TeachingJob = decode_required(StatusCode::OK, body).unwrap();
        assert_eq!(job.job_id.as_str(), "j1");
        assert_eq!(job.conversation_id.as_str(), "c1");
    }

    #[test]
    fn failure_envelope_becomes_api_failure() {
        let body = r#"{"success":false,"message":"Topic not found","data":null,"error":{"code":"TOPIC_NOT_FOUND"}}"#;
        let err = decode::<TeachingJob>(StatusCode::OK, body).unwrap_err();
        match err {
            ApiError::Api(failure) => {
                assert_eq!(failure.code, "TOPIC_NOT_FOUND");
                assert_eq!(failure.message, "Topic not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn list_messages_are_joined() {
        let body = r#"{"success":false,"message":["topicId must be a UUID","userId should not be empty"],"data":null,"error":{"code":"VALIDATION_ERROR"}}"#;
        let err = decode::<TeachingJob>(StatusCode::BAD_REQUEST, body).unwrap_err();
        let failure = err.into_failure();
        assert_eq!(failure.code, "VALIDATION_ERROR");
        assert_eq!(
            failure.message,
            "topicId must be a UUID, userId should not be empty"
        );
    }

    #[test]
    fn non_envelope_error_body_reports_status() {
        let err = decode::<TeachingJob>(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(StatusCode::BAD_GATEWAY)));
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let body = r#"{"success":true,"message":"ok","data":null}"#;
        let err = decode_required::<TeachingJob>(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn partial_queue_payload_is_pending() {
        let body = r#"{"success":true,"message":"queued","data":{"status":"processing"}}"#;
        let payload: Option<TeachingContent> = decode(StatusCode::OK, body).unwrap();
        assert_eq!(JobStatus::from_payload(payload), JobStatus::Pending);

        let body = r#"{"success":true,"message":"queued","data":null}"#;
        let payload: Option<TeachingContent> = decode(StatusCode::OK, body).unwrap();
        assert_eq!(JobStatus::from_payload(payload), JobStatus::Pending);
    }

    #[test]
    fn absent_data_field_decodes_as_none() {
        let body = r#"{"success":true,"message":"queued"}"#;
        let payload: Option<TeachingContent> = decode(StatusCode::OK, body).unwrap();
        assert!(payload.is_none());

        let body = r#"{"success":false,"message":"Job not found","error":{"code":"JOB_NOT_FOUND"}}"#;
        let failure = decode::<TeachingContent>(StatusCode::NOT_FOUND, body)
            .unwrap_err()
            .into_failure();
        assert_eq!(failure.code, "JOB_NOT_FOUND");
    }

    #[test]
    fn populated_queue_payload_is_ready() {
        let body = r#"{"success":true,"message":"done","data":{
            "courseCode":"MTH101","courseTitle":"Calculus I","topic":"Limits",
            "syllabusReference":"1.2","explanation":"A limit is...",
            "keyConcepts":["Left limit"],"workedExamples":[],"practicalApplications":[],
            "syllabusCoverage":[],"followUpQuestions":[]}}"#;
        let payload: Option<TeachingContent> = decode(StatusCode::OK, body).unwrap();
        match JobStatus::from_payload(payload) {
            JobStatus::Ready(content) => assert_eq!(content.topic, "Limits"),
            JobStatus::Pending => panic!("expected a ready lesson"),
        }
    }
}
