#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod content_service;
pub mod error;
pub mod progress_view;
pub mod session_service;
pub mod stats_service;
pub mod sync_service;

pub use revise_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, BootstrapAdmin};
pub use content_service::ContentService;
pub use error::{
    AppServicesError, AuthError, ContentServiceError, SessionError, StatsError, SyncError,
};
pub use progress_view::{SubjectProgress, subject_progress};
pub use session_service::SessionManager;
pub use stats_service::StatsService;
pub use sync_service::ProgressSyncService;
