//! Deferred install prompt.
//!
//! The banner never appears straight away: it waits a short delay after the
//! platform says installation is possible (or, on iOS, after mount, since
//! iOS only supports manual "Add to Home Screen"). Dismissal is remembered
//! with a timestamp so the banner stays away across restarts.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Delay between install becoming possible and the banner appearing.
pub const PROMPT_DELAY: Duration = Duration::from_millis(2500);
/// Length of the banner's exit transition.
pub const EXIT_TRANSITION: Duration = Duration::from_millis(350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPlatform {
    /// Platforms that hand over a native install prompt.
    Standard,
    /// iOS Safari: manual instructions only.
    Ios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Hidden,
    Pending,
    Shown,
    Closing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallEvent {
    Mounted,
    /// A native install prompt was captured and deferred.
    InstallAvailable,
    ShowDue,
    Install,
    InstallChoiceSettled,
    Dismiss,
    CloseDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallCommand {
    ShowAfter { delay: Duration },
    PromptNative,
    PersistDismissal { at: DateTime<Utc> },
    CloseAfter { delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPrompt {
    platform: InstallPlatform,
    standalone: bool,
    suppressed: bool,
    deferred: bool,
    state: PromptState,
    visible: bool,
}

impl InstallPrompt {
    #[must_use]
    pub fn new(platform: InstallPlatform, standalone: bool, previously_dismissed: bool) -> Self {
        Self {
            platform,
            standalone,
            suppressed: standalone || previously_dismissed,
            deferred: false,
            state: PromptState::Hidden,
            visible: false,
        }
    }

    pub fn handle_event(&mut self, event: InstallEvent, now: DateTime<Utc>) -> Vec<InstallCommand> {
        if self.suppressed {
            return Vec::new();
        }
        match event {
            InstallEvent::Mounted => {
                if self.platform == InstallPlatform::Ios && self.state == PromptState::Hidden {
                    self.state = PromptState::Pending;
                    return vec![InstallCommand::ShowAfter {
                        delay: PROMPT_DELAY,
                    }];
                }
                Vec::new()
            }
            InstallEvent::InstallAvailable => {
                self.deferred = true;
                if self.state != PromptState::Hidden {
                    return Vec::new();
                }
                self.state = PromptState::Pending;
                vec![InstallCommand::ShowAfter {
                    delay: PROMPT_DELAY,
                }]
            }
            InstallEvent::ShowDue => {
                if self.state == PromptState::Pending {
                    self.state = PromptState::Shown;
                    self.visible = true;
                }
                Vec::new()
            }
            InstallEvent::Install => {
                if self.state != PromptState::Shown || !self.deferred {
                    return Vec::new();
                }
                vec![InstallCommand::PromptNative]
            }
            InstallEvent::InstallChoiceSettled | InstallEvent::Dismiss => self.dismiss(now),
            InstallEvent::CloseDue => {
                if self.state == PromptState::Closing {
                    self.state = PromptState::Done;
                    self.deferred = false;
                }
                Vec::new()
            }
        }
    }

    fn dismiss(&mut self, now: DateTime<Utc>) -> Vec<InstallCommand> {
        if self.state != PromptState::Shown {
            return Vec::new();
        }
        self.state = PromptState::Closing;
        self.visible = false;
        vec![
            InstallCommand::PersistDismissal { at: now },
            InstallCommand::CloseAfter {
                delay: EXIT_TRANSITION,
            },
        ]
    }

    #[must_use]
    pub fn platform(&self) -> InstallPlatform {
        self.platform
    }

    #[must_use]
    pub fn state(&self) -> PromptState {
        self.state
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the banner is in the tree at all.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.standalone && matches!(self.state, PromptState::Shown | PromptState::Closing)
    }

    /// Whether the native "Install app" button can be offered.
    #[must_use]
    pub fn can_install(&self) -> bool {
        self.deferred && self.platform == InstallPlatform::Standard
    }
}
