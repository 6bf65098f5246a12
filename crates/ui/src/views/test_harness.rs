use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use tokio::sync::watch;

use learn_core::ApiFailure;
use learn_core::install::InstallPlatform;
use learn_core::model::{
    ApiSettingsDraft, ConversationId, FollowUpAnswer, JobId, JobStatus, TeachingContent,
    TeachingJob, TopicId, UserId,
};
use learn_core::time::fixed_clock;
use services::api::TutorApi;
use services::error::UpdateError;
use services::platform::{AppShell, DesktopInstallHost, InstallHost, UpdateProbe};
use services::{ApiError, InstallService, TutorSessionService, UpdateService};
use storage::repository::InMemoryFlags;

use crate::context::{UiApp, build_app_context};
use crate::views::{InstallBanner, TutorView, UpdateToast};

pub fn lesson() -> TeachingContent {
    TeachingContent {
        course_code: "MTH101".into(),
        course_title: "Calculus I".into(),
        level: Some(100),
        topic: "Limits".into(),
        explanation: "A **limit** describes where a function is heading.".into(),
        key_concepts: vec!["One-sided limits".into()],
        worked_examples: vec!["lim x→2 of x² = 4".into()],
        ..TeachingContent::default()
    }
}

/// Tutor backend that answers every request immediately.
pub struct ScriptedTutorApi {
    pub generation: Mutex<Option<ApiFailure>>,
}

impl ScriptedTutorApi {
    pub fn ok() -> Self {
        Self {
            generation: Mutex::new(None),
        }
    }

    pub fn failing(failure: ApiFailure) -> Self {
        Self {
            generation: Mutex::new(Some(failure)),
        }
    }
}

#[async_trait]
impl TutorApi for ScriptedTutorApi {
    async fn submit_teaching_job(
        &self,
        _topic_id: TopicId,
        _user_id: &UserId,
    ) -> Result<TeachingJob, ApiError> {
        if let Some(failure) = self.generation.lock().unwrap().clone() {
            return Err(ApiError::Api(failure));
        }
        Ok(TeachingJob {
            job_id: JobId::new("job-1"),
            conversation_id: ConversationId::new("conv-1"),
        })
    }

    async fn poll_job(&self, _job_id: &JobId) -> Result<JobStatus, ApiError> {
        Ok(JobStatus::Ready(lesson()))
    }

    async fn ask_follow_up(
        &self,
        question: &str,
        _conversation_id: &ConversationId,
        _user_id: &UserId,
    ) -> Result<FollowUpAnswer, ApiError> {
        Ok(FollowUpAnswer::new(format!("Answer to: {question}")))
    }
}

/// Probe that reports one waiting build on the first check.
pub struct WaitingBuildProbe {
    waiting: watch::Sender<Option<String>>,
}

impl WaitingBuildProbe {
    pub fn new() -> Self {
        let (waiting, _) = watch::channel(None);
        Self { waiting }
    }
}

#[async_trait]
impl UpdateProbe for WaitingBuildProbe {
    async fn check_reachable(&self) -> bool {
        true
    }

    async fn check_for_update(&self) -> Result<(), UpdateError> {
        self.waiting.send_replace(Some("2.0.0".into()));
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.waiting.subscribe()
    }
}

struct NoopShell;

#[async_trait]
impl AppShell for NoopShell {
    async fn activate_new_version(&self) -> Result<(), UpdateError> {
        Ok(())
    }

    fn reload(&self) {}
}

/// Browser-like install host for one platform.
pub struct BrowserHost {
    platform: InstallPlatform,
    available: watch::Sender<bool>,
}

impl BrowserHost {
    pub fn new(platform: InstallPlatform) -> Self {
        let (available, _) = watch::channel(platform == InstallPlatform::Standard);
        Self {
            platform,
            available,
        }
    }
}

#[async_trait]
impl InstallHost for BrowserHost {
    fn platform(&self) -> InstallPlatform {
        self.platform
    }

    fn is_standalone(&self) -> bool {
        false
    }

    fn subscribe_available(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }

    async fn prompt_install(&self) -> bool {
        true
    }
}

#[derive(Clone)]
struct TestApp {
    tutor: Arc<TutorSessionService>,
    updates: Option<Arc<UpdateService>>,
    install: Arc<InstallService>,
}

impl UiApp for TestApp {
    fn tutor(&self) -> Arc<TutorSessionService> {
        Arc::clone(&self.tutor)
    }

    fn updates(&self) -> Option<Arc<UpdateService>> {
        self.updates.clone()
    }

    fn install(&self) -> Arc<InstallService> {
        Arc::clone(&self.install)
    }

    fn reloads(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Tutor,
    UpdateToast,
    InstallBanner,
}

/// Collaborators a harness is built from. Defaults to a healthy backend,
/// no update origin and the desktop install host.
pub struct HarnessSetup {
    pub view: ViewKind,
    pub tutor_api: Arc<dyn TutorApi>,
    pub update_probe: Option<Arc<dyn UpdateProbe>>,
    pub force_update: bool,
    pub install_host: Arc<dyn InstallHost>,
}

impl HarnessSetup {
    pub fn new(view: ViewKind) -> Self {
        Self {
            view,
            tutor_api: Arc::new(ScriptedTutorApi::ok()),
            update_probe: None,
            force_update: false,
            install_host: Arc::new(DesktopInstallHost::new()),
        }
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Tutor => rsx! { TutorView {} },
        ViewKind::UpdateToast => rsx! { UpdateToast {} },
        ViewKind::InstallBanner => rsx! { InstallBanner {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(Duration::from_millis(50), self.dom.wait_for_work()).await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Poll component futures, let background tasks run for `elapsed`,
    /// then flush pending renders.
    pub async fn settle(&mut self, elapsed: Duration) {
        for _ in 0..2 {
            self.drive_async().await;
        }
        tokio::time::sleep(elapsed).await;
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn setup_view_harness(setup: HarnessSetup) -> ViewHarness {
    let clock = fixed_clock();
    let settings = ApiSettingsDraft {
        base_url: Some("https://api.example.com".into()),
        user_id: Some("student-1".into()),
        topic_id: Some("64f572ac-03e3-42d2-b81e-0baf063738b7".into()),
    }
    .validate()
    .expect("valid settings");

    let tutor = Arc::new(TutorSessionService::new(setup.tutor_api, settings, clock));
    let updates = setup.update_probe.map(|probe| {
        Arc::new(UpdateService::new(
            probe,
            Arc::new(NoopShell),
            Arc::new(InMemoryFlags::new()),
            clock,
            setup.force_update,
        ))
    });
    let install = Arc::new(InstallService::new(
        setup.install_host,
        Arc::new(InMemoryFlags::new()),
        clock,
    ));

    let app = Arc::new(TestApp {
        tutor,
        updates,
        install,
    });
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            view: setup.view,
        },
    );
    ViewHarness { dom }
}
