#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod sessions;

pub use toeic_core::Clock;

pub use app_services::AppServices;
pub use auth::AuthContext;
pub use config::AppConfig;
pub use dashboard::{DashboardOverview, DashboardService};
pub use error::{AppServicesError, AuthError, ConfigError, DashboardError, SessionError};
pub use notify::{Notification, NotificationLevel, Notifier};

pub use sessions::{
    AdvanceOutcome, AnswerFeedback, CompletionSummary, LessonPage, LessonSession,
    LessonSessionLoop, PendingPersistence, PersistenceReport, SessionPhase,
};
