mod install_banner;
mod tutor;
mod update_toast;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use install_banner::InstallBanner;
pub use tutor::TutorView;
pub use update_toast::UpdateToast;
