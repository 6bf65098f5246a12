mod install_vm;
mod markdown_vm;
mod time_fmt;
mod tutor_vm;
mod update_vm;

pub use install_vm::{
    GOT_IT_LABEL, INSTALL_LABEL, InstallBannerVm, InstallBody, NOT_NOW_LABEL, map_install_prompt,
};
pub use markdown_vm::{inline_markdown_to_html, markdown_to_html, sanitize_html};
pub use time_fmt::format_message_time;
pub use tutor_vm::{
    DISCLAIMER, ERROR_TITLE, ErrorVm, FollowUpErrorVm, LOADING_TITLE, LessonVm, MessageBody,
    MessageVm, QUICK_ACTIONS_LABEL, RETRY_LABEL, StatusPanel, TYPING_TEXT, TutorVm,
    map_tutor_session,
};
pub use update_vm::{LATER_LABEL, REFRESH_LABEL, UpdateToastVm, map_update_notice};
