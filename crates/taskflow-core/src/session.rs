use anyhow::Context;
use parking_lot::RwLock;
use taskflow_shared::{AuthResponse, User};
use tracing::{debug, info, warn};

use crate::storage::{LocalStorage, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// The single active session, mirrored to durable storage.
///
/// Shared behind an `Arc` by the API client and the front end. The stored
/// token is trusted at startup; a stale one only surfaces when the backend
/// rejects the next request.
#[derive(Debug)]
pub struct SessionStore {
    storage: LocalStorage,
    slot: RwLock<Option<Session>>,
}

impl SessionStore {
    #[tracing::instrument(skip(storage), fields(dir = %storage.dir().display()))]
    pub fn restore(storage: LocalStorage) -> anyhow::Result<Self> {
        let token = storage.get_item(TOKEN_KEY)?;
        let user = storage.get_item(USER_KEY)?;

        let restored = match (token, user) {
            (Some(token), Some(raw_user)) if !token.trim().is_empty() => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => Some(Session {
                        token: token.trim().to_string(),
                        user,
                    }),
                    Err(err) => {
                        warn!(error = %err, "stored user record is unreadable; ignoring session");
                        None
                    }
                }
            }
            _ => None,
        };

        info!(has_session = restored.is_some(), "session store initialized");
        Ok(Self {
            storage,
            slot: RwLock::new(restored),
        })
    }

    /// A store that starts empty regardless of what is on disk.
    pub fn empty(storage: LocalStorage) -> Self {
        Self {
            storage,
            slot: RwLock::new(None),
        }
    }

    #[tracing::instrument(skip(self, response), fields(user = %response.user.email))]
    pub fn login(&self, response: AuthResponse) -> anyhow::Result<()> {
        let user_json =
            serde_json::to_string(&response.user).context("failed to encode user record")?;
        self.storage.set_item(TOKEN_KEY, &response.token)?;
        self.storage.set_item(USER_KEY, &user_json)?;

        *self.slot.write() = Some(Session {
            token: response.token,
            user: response.user,
        });
        info!("session stored");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn logout(&self) -> anyhow::Result<()> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(USER_KEY)?;
        let previous = self.slot.write().take();
        debug!(had_session = previous.is_some(), "session cleared");
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.slot.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.slot.read().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.slot.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn display_name(&self) -> Option<String> {
        self.slot
            .read()
            .as_ref()
            .map(|s| s.user.display_name().to_string())
    }
}
