use std::sync::Arc;
use std::time::Duration;

use learn_core::ApiFailure;
use learn_core::install::InstallPlatform;

use super::test_harness::{
    BrowserHost, HarnessSetup, ScriptedTutorApi, ViewKind, WaitingBuildProbe, setup_view_harness,
};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn tutor_view_smoke_renders_loading_state() {
    let mut harness = setup_view_harness(HarnessSetup::new(ViewKind::Tutor));
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Preparing your lesson"), "missing loading title in {html}");
    assert!(html.contains("Read the lesson first"), "missing lock hint in {html}");
    assert!(html.contains("Waiting for your lesson"), "missing placeholder in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn tutor_view_smoke_renders_delivered_lesson() {
    let mut harness = setup_view_harness(HarnessSetup::new(ViewKind::Tutor));
    harness.rebuild();
    harness.settle(Duration::from_secs(20)).await;

    let html = harness.render();
    assert!(html.contains("MTH101: Calculus I"), "missing heading in {html}");
    assert!(html.contains("<strong>limit</strong>"), "missing explanation in {html}");
    assert!(html.contains("Worked Examples (1)"), "missing examples in {html}");
    assert!(html.contains("Quick actions:"), "missing quick actions in {html}");
    assert!(html.contains("Ask me anything about Limits"), "missing placeholder in {html}");
    assert!(!html.contains("Read the lesson first"), "input still locked in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn tutor_view_smoke_renders_generation_error() {
    let mut setup = HarnessSetup::new(ViewKind::Tutor);
    setup.tutor_api = Arc::new(ScriptedTutorApi::failing(ApiFailure::new(
        "TOPIC_NOT_FOUND",
        "Topic does not exist",
    )));
    let mut harness = setup_view_harness(setup);
    harness.rebuild();
    harness.settle(Duration::from_secs(1)).await;

    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing error title in {html}");
    assert!(html.contains("Topic does not exist"), "missing message in {html}");
    assert!(html.contains("TOPIC_NOT_FOUND"), "missing code in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn update_toast_smoke_offers_refresh_and_later() {
    let mut setup = HarnessSetup::new(ViewKind::UpdateToast);
    setup.update_probe = Some(Arc::new(WaitingBuildProbe::new()));
    let mut harness = setup_view_harness(setup);
    harness.rebuild();
    harness.settle(Duration::from_secs(1)).await;

    let html = harness.render();
    assert!(html.contains("Update available"), "missing title in {html}");
    assert!(html.contains("A newer version of NextGrades is ready."), "missing body in {html}");
    assert!(html.contains("Refresh now"), "missing refresh in {html}");
    assert!(html.contains("Later"), "missing later in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn update_toast_smoke_forced_update_hides_later() {
    let mut setup = HarnessSetup::new(ViewKind::UpdateToast);
    setup.update_probe = Some(Arc::new(WaitingBuildProbe::new()));
    setup.force_update = true;
    let mut harness = setup_view_harness(setup);
    harness.rebuild();
    harness.settle(Duration::from_secs(1)).await;

    let html = harness.render();
    assert!(html.contains("This update is required"), "missing forced body in {html}");
    assert!(!html.contains("Later"), "unexpected later in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn update_toast_smoke_without_origin_renders_nothing() {
    let mut harness = setup_view_harness(HarnessSetup::new(ViewKind::UpdateToast));
    harness.rebuild();
    harness.settle(Duration::from_secs(1)).await;
    assert!(!harness.render().contains("Update available"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn install_banner_smoke_shows_ios_steps_after_delay() {
    let mut setup = HarnessSetup::new(ViewKind::InstallBanner);
    setup.install_host = Arc::new(BrowserHost::new(InstallPlatform::Ios));
    let mut harness = setup_view_harness(setup);
    harness.rebuild();

    harness.settle(Duration::from_secs(1)).await;
    assert!(!harness.render().contains("Install NextGrades"));

    harness.settle(Duration::from_secs(3)).await;
    let html = harness.render();
    assert!(html.contains("Install NextGrades"), "missing title in {html}");
    assert!(html.contains("Add NextGrades to your home screen:"), "missing intro in {html}");
    assert!(html.contains("Got it"), "missing got it in {html}");
    assert!(!html.contains("Install app"), "unexpected native button in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn install_banner_smoke_offers_native_install() {
    let mut setup = HarnessSetup::new(ViewKind::InstallBanner);
    setup.install_host = Arc::new(BrowserHost::new(InstallPlatform::Standard));
    let mut harness = setup_view_harness(setup);
    harness.rebuild();
    harness.settle(Duration::from_secs(4)).await;

    let html = harness.render();
    assert!(html.contains("Install app"), "missing install button in {html}");
    assert!(html.contains("Not now"), "missing not now in {html}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn install_banner_smoke_desktop_renders_nothing() {
    let mut harness = setup_view_harness(HarnessSetup::new(ViewKind::InstallBanner));
    harness.rebuild();
    harness.settle(Duration::from_secs(4)).await;
    assert!(!harness.render().contains("Install NextGrades"));
}
