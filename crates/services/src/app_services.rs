use std::sync::Arc;

use reqwest::Client;
use storage::repository::AuthStore;
use storage::sqlite::SqliteRepository;
use tracing::info;

use crate::Clock;
use crate::api::{
    ApiClient, AuthApi, AuthGateway, ContentSource, CourseApi, HttpProgressRepository,
    PracticeApi, ProfileApi,
};
use crate::auth::AuthContext;
use crate::config::AppConfig;
use crate::dashboard::DashboardService;
use crate::error::{AppServicesError, AuthError};
use crate::notify::Notifier;
use crate::sessions::LessonSessionLoop;

/// Assembles app-facing services from configuration.
#[derive(Clone)]
pub struct AppServices {
    notifier: Notifier,
    content: Arc<dyn ContentSource>,
    practice: Arc<PracticeApi>,
    profiles: Arc<ProfileApi>,
    session_loop: Arc<LessonSessionLoop>,
    dashboard: Arc<DashboardService>,
    auth_gateway: Arc<dyn AuthGateway>,
    auth_store: Arc<dyn AuthStore>,
}

impl AppServices {
    /// Build HTTP-backed services plus the `SQLite` auth store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client or the local database
    /// cannot be initialised.
    pub async fn new(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let auth_store: Arc<dyn AuthStore> = Arc::new(SqliteRepository::open(&config.db_url).await?);
        Self::with_auth_store(config, clock, auth_store)
    }

    /// Same as `new`, with a caller-provided auth store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Http` if the HTTP client cannot be built.
    pub fn with_auth_store(
        config: &AppConfig,
        clock: Clock,
        auth_store: Arc<dyn AuthStore>,
    ) -> Result<Self, AppServicesError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        let api = |base: &str| ApiClient::new(client.clone(), base);

        let content: Arc<dyn ContentSource> = Arc::new(CourseApi::new(
            api(&config.api_base_url),
            api(&config.theory_base_url),
        ));
        let progress = Arc::new(HttpProgressRepository::new(api(&config.progress_base_url)));
        let notifier = Notifier::new();

        let session_loop = Arc::new(LessonSessionLoop::new(
            clock,
            Arc::clone(&content),
            progress.clone(),
            progress.clone(),
            notifier.clone(),
        ));
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&content),
            progress.clone(),
            progress,
        ));
        info!(
            api = %config.api_base_url,
            progress = %config.progress_base_url,
            "app services ready"
        );

        Ok(Self {
            notifier,
            content,
            practice: Arc::new(PracticeApi::new(api(&config.practice_base_url))),
            profiles: Arc::new(ProfileApi::new(api(&config.progress_base_url))),
            session_loop,
            dashboard,
            auth_gateway: Arc::new(AuthApi::new(api(&config.api_base_url))),
            auth_store,
        })
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub fn content(&self) -> Arc<dyn ContentSource> {
        Arc::clone(&self.content)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeApi> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileApi> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<LessonSessionLoop> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    /// Auth context restored from the local store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store cannot be read.
    pub async fn auth(&self) -> Result<AuthContext, AuthError> {
        AuthContext::hydrate(Arc::clone(&self.auth_gateway), Arc::clone(&self.auth_store)).await
    }
}
