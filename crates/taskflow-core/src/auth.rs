use std::sync::LazyLock;

use regex::Regex;
use taskflow_shared::{AuthResponse, LoginRequest, RegisterRequest, User};
use tracing::{error, info, instrument, warn};

use crate::api::TaskflowApi;
use crate::session::SessionStore;

pub const DEMO_EMAIL: &str = "demo@taskflow.pro";
pub const DEMO_PASSWORD: &str = "Password123!";
pub const DEMO_NAME: &str = "Demo User";
pub const DEMO_MOCK_TOKEN: &str = "demo-mock-token-12345";
pub const DEMO_USER_ID: &str = "demo-user-id";

const DEMO_FAILED: &str =
    "Failed to sign in with demo account. Please try registering manually.";

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    /// Backend unreachable; a local demo session was created instead.
    AuthenticatedOffline,
    /// Local validation failed; nothing was sent.
    Invalid,
    Failed,
}

/// State behind the sign-in and sign-up forms: the inline error text and
/// whether a request is in flight.
#[derive(Debug, Default)]
pub struct AuthScreen {
    error: Option<String>,
    is_loading: bool,
}

impl AuthScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[instrument(skip(self, api, session, password))]
    pub async fn login<A: TaskflowApi>(
        &mut self,
        api: &A,
        session: &SessionStore,
        email: &str,
        password: &str,
    ) -> AuthOutcome {
        self.error = None;
        if let Err(message) = validate(&[("Email", email), ("Password", password)], email) {
            self.error = Some(message);
            return AuthOutcome::Invalid;
        }

        self.is_loading = true;
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let outcome = match api.login(&request).await {
            Ok(response) => self.store(session, response, AuthOutcome::Authenticated),
            Err(err) => {
                warn!(error = %err, "login failed");
                self.error = Some(err.message_or("Invalid email or password"));
                AuthOutcome::Failed
            }
        };
        self.is_loading = false;
        outcome
    }

    #[instrument(skip(self, api, session, password))]
    pub async fn register<A: TaskflowApi>(
        &mut self,
        api: &A,
        session: &SessionStore,
        name: &str,
        email: &str,
        password: &str,
    ) -> AuthOutcome {
        self.error = None;
        if let Err(message) = validate(
            &[("Full Name", name), ("Email", email), ("Password", password)],
            email,
        ) {
            self.error = Some(message);
            return AuthOutcome::Invalid;
        }

        self.is_loading = true;
        let request = RegisterRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let outcome = match api.register(&request).await {
            Ok(response) => self.store(session, response, AuthOutcome::Authenticated),
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.error = Some(err.message_or("Registration failed"));
                AuthOutcome::Failed
            }
        };
        self.is_loading = false;
        outcome
    }

    /// Signs in with the shared demo account, registering it on first use.
    /// Falls back to a local mock session when the backend is unreachable.
    #[instrument(skip_all)]
    pub async fn demo_login<A: TaskflowApi>(
        &mut self,
        api: &A,
        session: &SessionStore,
    ) -> AuthOutcome {
        self.error = None;
        self.is_loading = true;

        let credentials = LoginRequest {
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
        };

        let outcome = match api.login(&credentials).await {
            Ok(response) => self.store(session, response, AuthOutcome::Authenticated),
            Err(login_err) => {
                info!(error = %login_err, "demo login failed; registering demo account");
                let account = RegisterRequest {
                    name: DEMO_NAME.to_string(),
                    email: DEMO_EMAIL.to_string(),
                    password: DEMO_PASSWORD.to_string(),
                };
                match api.register(&account).await {
                    Ok(response) => self.store(session, response, AuthOutcome::Authenticated),
                    Err(err) if err.is_network_unreachable() => {
                        warn!("backend unreachable; entering demo mode with mock session");
                        self.store(session, mock_demo_session(), AuthOutcome::AuthenticatedOffline)
                    }
                    Err(err) => {
                        error!(error = %err, "demo registration failed");
                        self.error = Some(DEMO_FAILED.to_string());
                        AuthOutcome::Failed
                    }
                }
            }
        };

        self.is_loading = false;
        outcome
    }

    fn store(
        &mut self,
        session: &SessionStore,
        response: AuthResponse,
        success: AuthOutcome,
    ) -> AuthOutcome {
        match session.login(response) {
            Ok(()) => success,
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to persist session");
                self.error = Some(format!("Signed in, but the session could not be saved: {err:#}"));
                AuthOutcome::Failed
            }
        }
    }
}

pub fn mock_demo_session() -> AuthResponse {
    AuthResponse {
        token: DEMO_MOCK_TOKEN.to_string(),
        user: User {
            id: DEMO_USER_ID.to_string(),
            email: DEMO_EMAIL.to_string(),
            name: Some(DEMO_NAME.to_string()),
        },
    }
}

fn validate(required: &[(&str, &str)], email: &str) -> Result<(), String> {
    if let Some((label, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(format!("{label} is required"));
    }
    if !looks_like_email(email) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

pub fn looks_like_email(email: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()))
}
