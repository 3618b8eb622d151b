use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskflow_shared::{
    ApiErrorBody, AuthResponse, LoginRequest, NewTask, RegisterRequest, Task, TaskPatch,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::session::SessionStore;

/// How a failed call should be treated by the screens that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The backend could not be reached at all; callers fall back to demo data.
    NetworkUnreachable,
    /// The backend (or the exchange with it) produced a definite failure.
    Rejected,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn class(&self) -> FailureClass {
        match self {
            ApiError::Unreachable(_) => FailureClass::NetworkUnreachable,
            ApiError::Rejected { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                FailureClass::Rejected
            }
        }
    }

    pub fn is_network_unreachable(&self) -> bool {
        self.class() == FailureClass::NetworkUnreachable
    }

    /// Text for the error banner, or `fallback` when the error carries none.
    pub fn message_or(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    /// Builds the error for a non-2xx response from its status and raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| {
                let reason = status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.as_u16().to_string());
                format!("API Error: {reason}")
            });
        ApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

impl ApiError {
    /// A failed `send` means no response status was received: refused or
    /// dropped connections, resets and timeouts all land here. Only a
    /// request that could not be built is a local fault.
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Transport(err.to_string())
        } else {
            ApiError::Unreachable(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Unreachable(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Backend operations the screens depend on.
#[allow(async_fn_in_trait)]
pub trait TaskflowApi {
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn register(&self, account: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl HttpApiClient {
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        session: Arc<SessionStore>,
    ) -> anyhow::Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url =
            Url::parse(trimmed).with_context(|| format!("invalid API base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot carry paths: {base_url}"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed building HTTP client for the task API")?;

        debug!(base_url = %base_url, ?timeout, "http api client ready");
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport(format!("base URL cannot carry paths: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        authorized: bool,
    ) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json");

        if authorized && let Some(token) = self.session.token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|err| ApiError::Transport(format!("failed encoding request: {err}")))?;
            request = request.body(payload);
        }

        let response = request.send().await.map_err(|err| {
            let err = ApiError::from_send(err);
            warn!(%method, %url, error = %err, "request did not complete");
            err
        })?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::from)?;
        debug!(%method, %url, status = status.as_u16(), bytes = text.len(), "response received");

        if status.is_success() {
            Ok(text)
        } else {
            Err(ApiError::from_response(status, &text))
        }
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|err| ApiError::Decode(err.to_string()))
}

impl TaskflowApi for HttpApiClient {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["login"])?;
        let text = self.execute(Method::POST, url, Some(credentials), false).await?;
        decode(&text)
    }

    #[instrument(skip_all, fields(email = %account.email))]
    async fn register(&self, account: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["register"])?;
        let text = self.execute(Method::POST, url, Some(account), false).await?;
        decode(&text)
    }

    #[instrument(skip_all)]
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let url = self.endpoint(&["tasks"])?;
        let text = self.execute::<()>(Method::GET, url, None, true).await?;
        decode(&text)
    }

    #[instrument(skip_all, fields(title = %task.title))]
    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let url = self.endpoint(&["tasks"])?;
        let text = self.execute(Method::POST, url, Some(task), true).await?;
        decode(&text)
    }

    #[instrument(skip(self, patch))]
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let url = self.endpoint(&["tasks", id])?;
        let text = self.execute(Method::PUT, url, Some(patch), true).await?;
        decode(&text)
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["tasks", id])?;
        self.execute::<()>(Method::DELETE, url, None, true).await?;
        Ok(())
    }
}
