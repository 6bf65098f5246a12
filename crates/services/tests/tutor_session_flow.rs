use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use learn_core::ApiFailure;
use learn_core::model::{
    ApiSettings, ApiSettingsDraft, ConversationId, FollowUpAnswer, JobId, JobStatus,
    TeachingContent, TeachingJob, TopicId, UserId,
};
use learn_core::time::fixed_clock;
use learn_core::tutor::{FailedStep, SessionPhase};
use services::api::TutorApi;
use services::{ApiError, TutorSessionService, TutorSnapshot};

#[derive(Default)]
struct FakeTutorApi {
    ready_after_polls: usize,
    fail_first_submit: AtomicBool,
    fail_first_ask: AtomicBool,
    submits: AtomicUsize,
    polls: AtomicUsize,
    asks: Mutex<Vec<(String, String, String)>>,
}

impl FakeTutorApi {
    fn ready_after(polls: usize) -> Self {
        Self {
            ready_after_polls: polls,
            ..Self::default()
        }
    }
}

fn lesson() -> TeachingContent {
    TeachingContent {
        course_code: "MTH101".into(),
        course_title: "Calculus I".into(),
        topic: "Limits".into(),
        explanation: "A limit describes where a function is heading.".into(),
        key_concepts: vec!["One-sided limits".into()],
        worked_examples: vec!["lim x→2 of x² = 4".into()],
        ..TeachingContent::default()
    }
}

#[async_trait]
impl TutorApi for FakeTutorApi {
    async fn submit_teaching_job(
        &self,
        _topic_id: TopicId,
        _user_id: &UserId,
    ) -> Result<TeachingJob, ApiError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.fail_first_submit.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Api(ApiFailure::new(
                "TOPIC_NOT_FOUND",
                "Topic does not exist",
            )));
        }
        Ok(TeachingJob {
            job_id: JobId::new("job-1"),
            conversation_id: ConversationId::new("conv-1"),
        })
    }

    async fn poll_job(&self, _job_id: &JobId) -> Result<JobStatus, ApiError> {
        let count = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.ready_after_polls {
            Ok(JobStatus::Ready(lesson()))
        } else {
            Ok(JobStatus::Pending)
        }
    }

    async fn ask_follow_up(
        &self,
        question: &str,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<FollowUpAnswer, ApiError> {
        self.asks.lock().unwrap().push((
            question.to_string(),
            conversation_id.as_str().to_string(),
            user_id.as_str().to_string(),
        ));
        if self.fail_first_ask.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Api(ApiFailure::new("AI_BUSY", "Tutor is busy")));
        }
        Ok(FollowUpAnswer::new(format!("Answer to: {question}")))
    }
}

fn settings() -> ApiSettings {
    ApiSettingsDraft {
        base_url: Some("https://api.example.com".into()),
        user_id: Some("student-1".into()),
        topic_id: Some("64f572ac-03e3-42d2-b81e-0baf063738b7".into()),
    }
    .validate()
    .unwrap()
}

fn service(api: Arc<FakeTutorApi>) -> TutorSessionService {
    TutorSessionService::new(api, settings(), fixed_clock())
}

async fn wait_until(
    rx: &mut watch::Receiver<TutorSnapshot>,
    predicate: impl FnMut(&TutorSnapshot) -> bool,
) -> TutorSnapshot {
    tokio::time::timeout(Duration::from_secs(600), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session task stopped")
        .clone()
}

#[tokio::test(start_paused = true)]
async fn lesson_is_delivered_after_polling() {
    let api = Arc::new(FakeTutorApi::ready_after(3));
    let handle = service(Arc::clone(&api)).start();
    handle.mount();
    let mut rx = handle.subscribe();

    let snapshot = wait_until(&mut rx, |s| s.session.phase() == SessionPhase::Teaching).await;
    assert_eq!(api.submits.load(Ordering::SeqCst), 1);
    assert_eq!(api.polls.load(Ordering::SeqCst), 3);
    assert_eq!(snapshot.session.messages().len(), 1);
    assert_eq!(snapshot.session.topic(), Some("Limits"));
    assert_eq!(snapshot.session.follow_up_suggestions().len(), 4);
    assert!(!snapshot.session.is_input_locked());

    let snapshot = wait_until(&mut rx, |s| s.focus_requests == 1).await;
    assert_eq!(snapshot.session.phase(), SessionPhase::Teaching);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn first_poll_waits_for_initial_delay() {
    let api = Arc::new(FakeTutorApi::ready_after(1));
    let handle = service(Arc::clone(&api)).start();
    let mut rx = handle.subscribe();

    wait_until(&mut rx, |s| s.session.job_id().is_some()).await;
    tokio::time::sleep(Duration::from_secs(14)).await;
    assert_eq!(api.polls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(api.polls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn pending_polls_follow_at_short_intervals() {
    let api = Arc::new(FakeTutorApi::ready_after(3));
    let handle = service(Arc::clone(&api)).start();
    let mut rx = handle.subscribe();

    wait_until(&mut rx, |s| s.session.job_id().is_some()).await;
    let polls_at = |secs: u64| {
        let api = Arc::clone(&api);
        async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            api.polls.load(Ordering::SeqCst)
        }
    };
    assert_eq!(polls_at(14).await, 0);
    assert_eq!(polls_at(2).await, 1);
    assert_eq!(polls_at(2).await, 2);
    assert_eq!(rx.borrow().session.phase(), SessionPhase::Loading);
    assert_eq!(polls_at(2).await, 3);

    let snapshot = wait_until(&mut rx, |s| s.session.phase() == SessionPhase::Teaching).await;
    assert_eq!(snapshot.session.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn follow_up_question_appends_answer() {
    let api = Arc::new(FakeTutorApi::ready_after(1));
    let handle = service(Arc::clone(&api)).start();
    let mut rx = handle.subscribe();
    wait_until(&mut rx, |s| s.session.phase() == SessionPhase::Teaching).await;

    handle.submit("  Why does the limit exist?  ");
    let snapshot = wait_until(&mut rx, |s| {
        s.session.messages().len() == 3 && !s.session.is_typing()
    })
    .await;

    assert_eq!(snapshot.session.phase(), SessionPhase::Chat);
    let texts: Vec<&str> = snapshot
        .session
        .messages()
        .iter()
        .map(|m| m.display_text())
        .collect();
    assert_eq!(texts[1], "Why does the limit exist?");
    assert_eq!(texts[2], "Answer to: Why does the limit exist?");

    let asks = api.asks.lock().unwrap().clone();
    assert_eq!(
        asks,
        vec![(
            "Why does the limit exist?".to_string(),
            "conv-1".to_string(),
            "student-1".to_string()
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_follow_up_can_be_retried() {
    let api = Arc::new(FakeTutorApi::ready_after(1));
    api.fail_first_ask.store(true, Ordering::SeqCst);
    let handle = service(Arc::clone(&api)).start();
    let mut rx = handle.subscribe();
    wait_until(&mut rx, |s| s.session.phase() == SessionPhase::Teaching).await;

    handle.submit("Quiz me on Limits");
    let snapshot = wait_until(&mut rx, |s| s.session.follow_up_error().is_some()).await;
    assert!(!snapshot.session.is_typing());
    assert_eq!(snapshot.session.messages().len(), 2);

    handle.retry_follow_up();
    let snapshot = wait_until(&mut rx, |s| s.session.messages().len() == 3).await;
    assert!(snapshot.session.follow_up_error().is_none());
    assert_eq!(api.asks.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn generation_failure_retries_only_generation() {
    let api = Arc::new(FakeTutorApi::ready_after(1));
    api.fail_first_submit.store(true, Ordering::SeqCst);
    let handle = service(Arc::clone(&api)).start();
    let mut rx = handle.subscribe();

    let snapshot = wait_until(&mut rx, |s| s.session.phase() == SessionPhase::Error).await;
    let failure = snapshot.session.failure().expect("failure recorded");
    assert_eq!(failure.step, FailedStep::Generation);
    assert_eq!(failure.error.message, "Topic does not exist");
    assert_eq!(api.polls.load(Ordering::SeqCst), 0);

    handle.retry();
    wait_until(&mut rx, |s| s.session.phase() == SessionPhase::Teaching).await;
    assert_eq!(api.submits.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let api = Arc::new(FakeTutorApi::ready_after(1));
    let handle = service(Arc::clone(&api)).start();
    let mut rx = handle.subscribe();
    wait_until(&mut rx, |s| s.session.job_id().is_some()).await;

    drop(handle);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.polls.load(Ordering::SeqCst), 0);
}
