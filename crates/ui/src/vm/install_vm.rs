use learn_core::install::{InstallPlatform, InstallPrompt};

pub const INSTALL_TITLE: &str = "Install NextGrades";
pub const INSTALL_BODY: &str = "Get quick access to lessons and quizzes — even offline.";
pub const INSTALL_LABEL: &str = "Install app";
pub const NOT_NOW_LABEL: &str = "Not now";
pub const IOS_INTRO: &str = "Add NextGrades to your home screen:";
pub const IOS_STEPS: [&str; 3] = [
    "Tap the Share icon",
    "Select “Add to Home Screen”",
    "Tap “Add” to finish",
];
pub const GOT_IT_LABEL: &str = "Got it";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallBody {
    /// Manual home-screen instructions; no native prompt exists.
    Steps {
        intro: &'static str,
        steps: &'static [&'static str],
    },
    Native { body: &'static str, can_install: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallBannerVm {
    pub title: &'static str,
    pub body: InstallBody,
    pub visible: bool,
}

impl InstallBannerVm {
    #[must_use]
    pub fn card_class(&self) -> &'static str {
        if self.visible {
            "install-card install-card--visible"
        } else {
            "install-card"
        }
    }
}

#[must_use]
pub fn map_install_prompt(prompt: &InstallPrompt) -> Option<InstallBannerVm> {
    if !prompt.is_mounted() {
        return None;
    }
    let body = match prompt.platform() {
        InstallPlatform::Ios => InstallBody::Steps {
            intro: IOS_INTRO,
            steps: &IOS_STEPS,
        },
        InstallPlatform::Standard => InstallBody::Native {
            body: INSTALL_BODY,
            can_install: prompt.can_install(),
        },
    };
    Some(InstallBannerVm {
        title: INSTALL_TITLE,
        body,
        visible: prompt.is_visible(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::install::InstallEvent;
    use learn_core::time::fixed_now;

    #[test]
    fn pending_banner_is_not_rendered() {
        let mut prompt = InstallPrompt::new(InstallPlatform::Standard, false, false);
        prompt.handle_event(InstallEvent::InstallAvailable, fixed_now());
        assert_eq!(map_install_prompt(&prompt), None);
    }

    #[test]
    fn ios_banner_lists_the_steps() {
        let mut prompt = InstallPrompt::new(InstallPlatform::Ios, false, false);
        prompt.handle_event(InstallEvent::Mounted, fixed_now());
        prompt.handle_event(InstallEvent::ShowDue, fixed_now());
        let vm = map_install_prompt(&prompt).expect("shown");
        assert_eq!(
            vm.body,
            InstallBody::Steps {
                intro: IOS_INTRO,
                steps: &IOS_STEPS,
            }
        );
        assert_eq!(vm.card_class(), "install-card install-card--visible");
    }

    #[test]
    fn native_banner_offers_install() {
        let mut prompt = InstallPrompt::new(InstallPlatform::Standard, false, false);
        prompt.handle_event(InstallEvent::InstallAvailable, fixed_now());
        prompt.handle_event(InstallEvent::ShowDue, fixed_now());
        let vm = map_install_prompt(&prompt).expect("shown");
        assert_eq!(
            vm.body,
            InstallBody::Native {
                body: INSTALL_BODY,
                can_install: true,
            }
        );
    }

    #[test]
    fn standalone_never_renders() {
        let mut prompt = InstallPrompt::new(InstallPlatform::Ios, true, false);
        prompt.handle_event(InstallEvent::Mounted, fixed_now());
        prompt.handle_event(InstallEvent::ShowDue, fixed_now());
        assert_eq!(map_install_prompt(&prompt), None);
    }
}
