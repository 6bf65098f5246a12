#![forbid(unsafe_code)]

pub mod error;
pub mod install;
pub mod model;
pub mod polling;
pub mod suggestions;
pub mod time;
pub mod tutor;
pub mod update;

pub use error::{ApiFailure, Error};
pub use time::Clock;
