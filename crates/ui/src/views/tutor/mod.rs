mod scripts;
#[allow(clippy::module_inception)]
mod tutor;

pub use tutor::TutorView;
