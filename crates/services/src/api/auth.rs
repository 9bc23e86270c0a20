use async_trait::async_trait;
use reqwest::Method;
use toeic_core::FetchError;
use toeic_core::model::{AuthResponse, LoginRequest, RegisterRequest};

use super::ApiClient;

/// Remote login/registration endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or is refused.
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, FetchError>;

    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or is refused.
    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, FetchError>;
}

#[derive(Clone, Debug)]
pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthGateway for AuthApi {
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, FetchError> {
        self.api.send_json(Method::POST, "auth/login", req).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, FetchError> {
        self.api.send_json(Method::POST, "auth/register", req).await
    }
}
