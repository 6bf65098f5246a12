use learn_core::update::{NoticeAction, UpdateNotice};

pub const UPDATE_TITLE: &str = "Update available";
pub const UPDATE_BODY: &str = "A newer version of NextGrades is ready.";
pub const UPDATE_BODY_FORCED: &str = "This update is required to continue using the app.";
pub const REFRESH_LABEL: &str = "Refresh now";
pub const LATER_LABEL: &str = "Later";

/// Presentation of the update dialog. `None` from [`map_update_notice`]
/// means the dialog is not in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateToastVm {
    pub title: &'static str,
    pub body: &'static str,
    pub visible: bool,
    pub can_dismiss: bool,
}

impl UpdateToastVm {
    #[must_use]
    pub fn overlay_class(&self) -> &'static str {
        if self.visible {
            "update-overlay update-overlay--visible"
        } else {
            "update-overlay"
        }
    }
}

#[must_use]
pub fn map_update_notice(notice: &UpdateNotice) -> Option<UpdateToastVm> {
    if !notice.is_mounted() {
        return None;
    }
    Some(UpdateToastVm {
        title: UPDATE_TITLE,
        body: if notice.force_update() {
            UPDATE_BODY_FORCED
        } else {
            UPDATE_BODY
        },
        visible: notice.is_visible(),
        can_dismiss: notice.actions().contains(&NoticeAction::Dismiss),
    })
}
