//! Explicit auth context handed to whatever needs the current user.

use serde::Deserialize;
use std::sync::Arc;
use storage::repository::AuthStore;
use toeic_core::FetchError;
use toeic_core::model::{LoginRequest, RegisterRequest, User};
use tracing::{info, warn};

use crate::api::AuthGateway;
use crate::error::AuthError;

const LOGIN_FAILED: &str = "login failed";
const REGISTRATION_FAILED: &str = "registration failed";

/// Signed-in identity plus the ports it is loaded from and saved to.
///
/// Built with `hydrate`, torn down with `logout`.
#[derive(Clone)]
pub struct AuthContext {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn AuthStore>,
    user: Option<User>,
}

impl AuthContext {
    /// Restore the persisted user, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the local store cannot be read.
    pub async fn hydrate(
        gateway: Arc<dyn AuthGateway>,
        store: Arc<dyn AuthStore>,
    ) -> Result<Self, AuthError> {
        let user = store.load_user().await?;
        info!(signed_in = user.is_some(), "auth context hydrated");
        Ok(Self {
            gateway,
            store,
            user,
        })
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` for blank input,
    /// `AuthError::Rejected` with the server's message when refused,
    /// and `AuthError::MissingUser` if the response names no user.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&User, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let req = LoginRequest {
            username: username.trim().to_owned(),
            password: password.to_owned(),
        };
        let resp = self
            .gateway
            .login(&req)
            .await
            .map_err(|e| rejected(e, LOGIN_FAILED))?;
        let user = resp.user.ok_or(AuthError::MissingUser)?;

        self.store.save_user(&user).await?;
        info!(user_id = %user.id, "logged in");
        Ok(self.user.insert(user))
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// Same as `login`; a refused registration carries the server's message.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<&User, AuthError> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let req = RegisterRequest {
            username: username.trim().to_owned(),
            email: email.trim().to_owned(),
            password: password.to_owned(),
        };
        self.gateway
            .register(&req)
            .await
            .map_err(|e| rejected(e, REGISTRATION_FAILED))?;
        info!(username = %req.username, "registered");

        self.login(username, password).await
    }

    /// Forget the user in memory and in the local store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the local store cannot be cleared.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        let previous = self.user.take();
        self.store.clear_user().await?;
        if let Some(user) = previous {
            info!(user_id = %user.id, "logged out");
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn rejected(err: FetchError, fallback: &str) -> AuthError {
    match err {
        FetchError::Status { status, body } => {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_owned());
            warn!(status, %message, "auth request refused");
            AuthError::Rejected(message)
        }
        other => AuthError::Fetch(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storage::repository::InMemoryRepository;
    use toeic_core::model::{AuthResponse, UserId};

    #[derive(Default)]
    struct FakeGateway {
        refuse_login: Option<String>,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl AuthGateway for FakeGateway {
        async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, FetchError> {
            self.calls.lock().unwrap().push("login");
            if let Some(body) = &self.refuse_login {
                return Err(FetchError::Status {
                    status: 401,
                    body: body.clone(),
                });
            }
            Ok(AuthResponse {
                message: "ok".into(),
                user_id: None,
                user: Some(User {
                    id: UserId::new(7),
                    username: req.username.clone(),
                    email: format!("{}@example.com", req.username),
                }),
            })
        }

        async fn register(&self, _req: &RegisterRequest) -> Result<AuthResponse, FetchError> {
            self.calls.lock().unwrap().push("register");
            Ok(AuthResponse {
                message: "created".into(),
                user_id: Some(UserId::new(7)),
                user: None,
            })
        }
    }

    async fn context(gateway: FakeGateway) -> (AuthContext, InMemoryRepository) {
        let store = InMemoryRepository::new();
        let ctx = AuthContext::hydrate(Arc::new(gateway), Arc::new(store.clone()))
            .await
            .unwrap();
        (ctx, store)
    }

    #[tokio::test]
    async fn login_persists_user_and_logout_clears_it() {
        let (mut ctx, store) = context(FakeGateway::default()).await;
        assert!(!ctx.is_authenticated());

        ctx.login("lan", "secret").await.unwrap();
        assert_eq!(store.load_user().await.unwrap().unwrap().username, "lan");

        let rehydrated = AuthContext::hydrate(
            Arc::new(FakeGateway::default()),
            Arc::new(store.clone()),
        )
        .await
        .unwrap();
        assert_eq!(rehydrated.user().map(|u| u.id), Some(UserId::new(7)));

        ctx.logout().await.unwrap();
        assert!(ctx.user().is_none());
        assert!(store.load_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refused_login_uses_server_message() {
        let gateway = FakeGateway {
            refuse_login: Some(r#"{ "message": "wrong password" }"#.into()),
            ..FakeGateway::default()
        };
        let (mut ctx, _) = context(gateway).await;
        let err = ctx.login("lan", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "wrong password");
    }

    #[tokio::test]
    async fn refused_login_without_message_falls_back() {
        let gateway = FakeGateway {
            refuse_login: Some("<html>".into()),
            ..FakeGateway::default()
        };
        let (mut ctx, _) = context(gateway).await;
        let err = ctx.login("lan", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn register_then_logs_in() {
        let gateway = Arc::new(FakeGateway::default());
        let store = InMemoryRepository::new();
        let mut ctx = AuthContext::hydrate(gateway.clone(), Arc::new(store))
            .await
            .unwrap();

        ctx.register("minh", "minh@example.com", "pw").await.unwrap();
        assert_eq!(*gateway.calls.lock().unwrap(), vec!["register", "login"]);
        assert!(ctx.is_authenticated());
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_the_server() {
        let gateway = Arc::new(FakeGateway::default());
        let mut ctx = AuthContext::hydrate(gateway.clone(), Arc::new(InMemoryRepository::new()))
            .await
            .unwrap();
        assert!(matches!(
            ctx.login("  ", "pw").await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(gateway.calls.lock().unwrap().is_empty());
    }
}
