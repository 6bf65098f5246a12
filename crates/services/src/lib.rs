#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod error;
pub mod install_service;
pub mod platform;
pub mod tutor_service;
pub mod update_service;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use config::{ServicesConfig, ServicesConfigDraft};
pub use error::{ApiError, AppServicesError, ConfigError, UpdateError};
pub use install_service::{InstallHandle, InstallService};
pub use tutor_service::{TutorHandle, TutorSessionService, TutorSnapshot};
pub use update_service::{UpdateHandle, UpdateService};
