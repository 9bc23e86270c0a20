//! Thin request/response mappers for the remote REST services.
//!
//! Every call issues exactly one request; non-success statuses become
//! `FetchError::Status` with the response text. Nothing is retried or cached.

mod auth;
mod content;
mod practice;
mod profile;
mod progress;

pub use auth::{AuthApi, AuthGateway};
pub use content::{ContentSource, CourseApi};
pub use practice::PracticeApi;
pub use profile::ProfileApi;
pub use progress::HttpProgressRepository;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use toeic_core::FetchError;
use tracing::{debug, warn};

/// Body of a successful response, tagged by how the server labelled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Body {
    Json(String),
    Text(String),
}

/// Base URL plus a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let body = self
            .execute(Method::GET, path, self.client.get(self.url(path)))
            .await?;
        decode(&body)
    }

    pub(crate) async fn get_body(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Body, FetchError> {
        let request = self.client.get(self.url(path)).query(query);
        self.execute(Method::GET, path, request).await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .request(method.clone(), self.url(path))
            .json(body);
        let body = self.execute(method, path, request).await?;
        decode(&body)
    }

    /// Like `send_json` but ignores whatever the server answers with.
    pub(crate) async fn send_json_discard<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), FetchError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .client
            .request(method.clone(), self.url(path))
            .json(body);
        self.execute(method, path, request).await.map(|_| ())
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let body = self
            .execute(Method::DELETE, path, self.client.delete(self.url(path)))
            .await?;
        decode(&body)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Body, FetchError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "remote response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%method, path, status = status.as_u16(), "remote request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Body, FetchError> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    let text = response.text().await.map_err(transport)?;
    Ok(if is_json {
        Body::Json(text)
    } else {
        Body::Text(text)
    })
}

/// Decode a body as JSON regardless of how the server labelled it.
fn decode<T: DeserializeOwned>(body: &Body) -> Result<T, FetchError> {
    let text = match body {
        Body::Json(text) | Body::Text(text) => text,
    };
    serde_json::from_str(text).map_err(|e| FetchError::Decode(e.to_string()))
}

fn transport(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}
