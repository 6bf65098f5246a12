//! Update notification controller.
//!
//! Tracks whether a newer build is waiting, whether the student has been
//! told about it, and drives the accept sequence (hide, activate, reload)
//! so the reload can only ever be requested once.

use std::time::Duration;

/// Length of the dialog's exit transition.
pub const EXIT_TRANSITION: Duration = Duration::from_millis(300);
/// Grace period between activation and reload so the new build takes control first.
pub const RELOAD_GRACE: Duration = Duration::from_millis(100);
/// Default spacing of background update probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeState {
    Idle,
    NoticeShown,
    Dismissed,
    Reloading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    Accept,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    /// The update probe was registered; kicks off the immediate check.
    Registered,
    /// The platform reports a waiting build.
    UpdateAvailable,
    /// A build different from the one already announced was found.
    Reset,
    Dismiss,
    Accept,
    ActivationSettled,
    /// The shell finished reloading into the activated build.
    Reloaded,
    ExitTransitionElapsed,
    ProbeDue,
    ReachabilitySettled(bool),
    UpdateCheckSettled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCommand {
    PersistDismissal,
    ClearDismissal,
    HideAfter { delay: Duration },
    ActivateNewVersion,
    ReloadAfter { delay: Duration },
    CheckReachability,
    CheckForUpdate,
    ScheduleProbe { after: Duration },
}

/// Process-wide update notification state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    force_update: bool,
    probe_interval: Duration,
    update_available: bool,
    dismissed: bool,
    shown_once: bool,
    state: NoticeState,
    mounted: bool,
    visible: bool,
    reload_requested: bool,
    probe_in_flight: bool,
}

impl UpdateNotice {
    /// `previously_dismissed` comes from the session-scoped dismissal flag.
    /// Force-update mode ignores it since dismissal is not an option there.
    #[must_use]
    pub fn new(force_update: bool, previously_dismissed: bool) -> Self {
        Self {
            force_update,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            update_available: false,
            dismissed: previously_dismissed && !force_update,
            shown_once: false,
            state: NoticeState::Idle,
            mounted: false,
            visible: false,
            reload_requested: false,
            probe_in_flight: false,
        }
    }

    #[must_use]
    pub fn with_probe_interval(mut self, probe_interval: Duration) -> Self {
        self.probe_interval = probe_interval;
        self
    }

    pub fn handle_event(&mut self, event: UpdateEvent) -> Vec<UpdateCommand> {
        match event {
            UpdateEvent::Registered | UpdateEvent::ProbeDue => self.start_probe(),
            UpdateEvent::UpdateAvailable => self.on_update_available(),
            UpdateEvent::Reset => self.on_reset(),
            UpdateEvent::Dismiss => self.on_dismiss(),
            UpdateEvent::Accept => self.on_accept(),
            UpdateEvent::ActivationSettled => self.on_activation_settled(),
            UpdateEvent::Reloaded => self.on_reloaded(),
            UpdateEvent::ExitTransitionElapsed => {
                if !self.visible {
                    self.mounted = false;
                }
                Vec::new()
            }
            UpdateEvent::ReachabilitySettled(true) if self.probe_in_flight => {
                vec![UpdateCommand::CheckForUpdate]
            }
            UpdateEvent::ReachabilitySettled(false) | UpdateEvent::UpdateCheckSettled
                if self.probe_in_flight =>
            {
                self.probe_in_flight = false;
                vec![UpdateCommand::ScheduleProbe {
                    after: self.probe_interval,
                }]
            }
            UpdateEvent::ReachabilitySettled(_) | UpdateEvent::UpdateCheckSettled => Vec::new(),
        }
    }

    fn start_probe(&mut self) -> Vec<UpdateCommand> {
        if self.probe_in_flight {
            return Vec::new();
        }
        self.probe_in_flight = true;
        vec![UpdateCommand::CheckReachability]
    }

    fn on_update_available(&mut self) -> Vec<UpdateCommand> {
        self.update_available = true;
        if self.shown_once || self.dismissed || self.state != NoticeState::Idle {
            return Vec::new();
        }
        self.shown_once = true;
        self.state = NoticeState::NoticeShown;
        self.mounted = true;
        self.visible = true;
        Vec::new()
    }

    fn on_reset(&mut self) -> Vec<UpdateCommand> {
        if self.state == NoticeState::Reloading {
            return Vec::new();
        }
        let had_dismissal = self.dismissed;
        self.dismissed = false;
        self.shown_once = false;
        if self.state == NoticeState::Dismissed {
            self.state = NoticeState::Idle;
        }
        let mut cmds = Vec::new();
        if had_dismissal {
            cmds.push(UpdateCommand::ClearDismissal);
        }
        if self.update_available && self.state == NoticeState::Idle {
            cmds.extend(self.on_update_available());
        }
        cmds
    }

    fn on_dismiss(&mut self) -> Vec<UpdateCommand> {
        if self.force_update || self.state != NoticeState::NoticeShown {
            return Vec::new();
        }
        self.dismissed = true;
        self.state = NoticeState::Dismissed;
        self.visible = false;
        vec![
            UpdateCommand::PersistDismissal,
            UpdateCommand::HideAfter {
                delay: EXIT_TRANSITION,
            },
        ]
    }

    fn on_accept(&mut self) -> Vec<UpdateCommand> {
        if self.state != NoticeState::NoticeShown {
            return Vec::new();
        }
        // Hidden before activation is requested.
        self.state = NoticeState::Reloading;
        self.visible = false;
        self.mounted = false;
        vec![UpdateCommand::ActivateNewVersion]
    }

    fn on_activation_settled(&mut self) -> Vec<UpdateCommand> {
        if self.state != NoticeState::Reloading || self.reload_requested {
            return Vec::new();
        }
        self.reload_requested = true;
        vec![UpdateCommand::ReloadAfter {
            delay: RELOAD_GRACE,
        }]
    }

    /// The running build is now the one that was waiting, so nothing is
    /// pending and the next build gets a fresh announcement.
    fn on_reloaded(&mut self) -> Vec<UpdateCommand> {
        if self.state != NoticeState::Reloading || !self.reload_requested {
            return Vec::new();
        }
        self.state = NoticeState::Idle;
        self.reload_requested = false;
        self.update_available = false;
        self.shown_once = false;
        self.dismissed = false;
        self.mounted = false;
        self.visible = false;
        Vec::new()
    }

    #[must_use]
    pub fn state(&self) -> NoticeState {
        self.state
    }

    #[must_use]
    pub fn force_update(&self) -> bool {
        self.force_update
    }

    #[must_use]
    pub fn update_available(&self) -> bool {
        self.update_available
    }

    #[must_use]
    pub fn dismissed(&self) -> bool {
        self.dismissed
    }

    /// Whether the dialog is in the tree (stays true during the exit transition).
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the dialog is in its shown (opaque) presentation.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_probing(&self) -> bool {
        self.probe_in_flight
    }

    #[must_use]
    pub fn actions(&self) -> &'static [NoticeAction] {
        if self.force_update {
            &[NoticeAction::Accept]
        } else {
            &[NoticeAction::Accept, NoticeAction::Dismiss]
        }
    }
}
