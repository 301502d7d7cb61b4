//! Process-wide session store.
//!
//! All mutation goes through the operations defined here (`set_auth`,
//! `logout`, `hydrate`); callers never write fields directly. The store is
//! cheap to share behind an `Arc` and safe to consult from concurrent tasks.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{RwLock, watch};

use bluemine_auth::{PermissionKey, Role};

use crate::persist::SessionPersistence;
use crate::user::UserProfile;

/// How long `logging_out` stays raised after a logout, so requests racing the
/// clear decline to attach a credential instead of resurrecting a stale token.
pub const DEFAULT_LOGOUT_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session persistence failed")]
    Persistence(#[source] anyhow::Error),
}

/// The five authenticated fields, as persisted and as replaced atomically by
/// `set_auth`. Field names match the original local-storage shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub role: Option<Role>,
    #[serde(default)]
    pub permissions: Vec<PermissionKey>,
    pub user: Option<UserProfile>,
}

impl SessionSnapshot {
    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Payload for `set_auth`: a successful login or refresh always carries both
/// tokens.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Option<Role>,
    pub permissions: Vec<PermissionKey>,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Default)]
struct State {
    snapshot: SessionSnapshot,
    hydrated: bool,
    logging_out: bool,
    // Guards the grace timer against a newer logout re-raising the flag.
    logout_epoch: u64,
}

/// Shared session store.
#[derive(Debug)]
pub struct SessionStore {
    state: Arc<RwLock<State>>,
    persist: Option<SessionPersistence>,
    grace: Duration,
    hydrated_tx: watch::Sender<bool>,
}

impl SessionStore {
    /// Store without durable persistence (tests, ephemeral processes).
    pub fn in_memory() -> Self {
        Self::build(None)
    }

    /// Store backed by a durable snapshot. Call `hydrate` once at startup.
    pub fn with_persistence(persist: SessionPersistence) -> Self {
        Self::build(Some(persist))
    }

    fn build(persist: Option<SessionPersistence>) -> Self {
        let (hydrated_tx, _) = watch::channel(false);
        Self {
            state: Arc::new(RwLock::new(State::default())),
            persist,
            grace: DEFAULT_LOGOUT_GRACE,
            hydrated_tx,
        }
    }

    /// Override the logout grace window.
    pub fn logout_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Atomically replace all five authenticated fields. Clears `logging_out`
    /// so a login immediately after a logout is unaffected by the grace
    /// window.
    pub async fn set_auth(&self, auth: SessionAuth) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.snapshot = SessionSnapshot {
                access_token: Some(auth.access_token),
                refresh_token: Some(auth.refresh_token),
                role: auth.role,
                permissions: auth.permissions,
                user: auth.user,
            };
            state.logging_out = false;
            state.snapshot.clone()
        };

        if let Some(persist) = &self.persist {
            if let Err(err) = persist.save(&snapshot).await {
                tracing::warn!("failed to persist session snapshot: {err:?}");
            }
        }
    }

    /// Clear the session to the unauthenticated state.
    ///
    /// `logging_out` stays raised for the grace window; requests that started
    /// before the clear observe it and decline to attach a credential.
    pub async fn logout(&self) {
        let epoch = {
            let mut state = self.state.write().await;
            state.snapshot = SessionSnapshot::default();
            state.logging_out = true;
            state.logout_epoch += 1;
            state.logout_epoch
        };

        if let Some(persist) = &self.persist {
            if let Err(err) = persist.clear().await {
                tracing::warn!("failed to clear persisted session: {err:?}");
            }
        }

        let state = Arc::clone(&self.state);
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut state = state.write().await;
            if state.logout_epoch == epoch {
                state.logging_out = false;
            }
        });
    }

    /// True iff an access token is present and no logout is in progress.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.snapshot.access_token.is_some() && !state.logging_out
    }

    /// Credential for outbound request decoration. Suppressed while logging
    /// out so a stale in-memory token cannot leak into a new request.
    pub async fn bearer_token(&self) -> Option<String> {
        let state = self.state.read().await;
        if state.logging_out {
            return None;
        }
        state.snapshot.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.snapshot.refresh_token.clone()
    }

    pub async fn role(&self) -> Option<Role> {
        self.state.read().await.snapshot.role.clone()
    }

    pub async fn permissions(&self) -> Vec<PermissionKey> {
        self.state.read().await.snapshot.permissions.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.snapshot.user.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn logging_out(&self) -> bool {
        self.state.read().await.logging_out
    }

    /// Whether persisted state has finished loading into memory. Route guards
    /// must not conclude "unauthenticated" before this flips true.
    pub async fn hydrated(&self) -> bool {
        self.state.read().await.hydrated
    }

    /// Suspend until rehydration completes.
    pub async fn wait_hydrated(&self) {
        let mut rx = self.hydrated_tx.subscribe();
        // Only errors if the store is gone, in which case there is nothing to
        // wait for.
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    /// Load the persisted snapshot into memory. Idempotent; `hydrated` flips
    /// true exactly once, even when no snapshot exists or loading fails.
    pub async fn hydrate(&self) -> Result<(), SessionError> {
        if self.hydrated().await {
            return Ok(());
        }

        let loaded = match &self.persist {
            Some(persist) => persist.load().await,
            None => Ok(None),
        };

        let result = {
            let mut state = self.state.write().await;
            let result = match loaded {
                Ok(Some(snapshot)) => {
                    // A login racing ahead of hydration wins.
                    if !state.hydrated && state.snapshot.is_empty() {
                        state.snapshot = snapshot;
                    }
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(err) => Err(SessionError::Persistence(err)),
            };
            state.hydrated = true;
            result
        };

        let _ = self.hydrated_tx.send(true);
        result
    }
}
