//! Read-only session context shared with checkers and guards.
//!
//! The session itself (sign-in, token refresh) belongs to the BaaS auth
//! service. This module only models what the gating pipeline reads from it:
//! the current identity and whether it is still being resolved.

pub mod epoch;

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

pub use epoch::{IdentityEpoch, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Signed-in user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Option<String>,
    /// Role carried in the token's app metadata, if any
    pub role_claim: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role_claim: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role_claim(mut self, role: impl Into<String>) -> Self {
        self.role_claim = Some(role.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<Identity>,
    pub loading: bool,
}

impl SessionSnapshot {
    /// Auth service has not answered yet
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            user: Some(identity),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Write side of the session channel, held by whatever owns authentication
pub struct SessionPublisher {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionPublisher {
    pub fn new(initial: SessionSnapshot) -> (Self, SessionHandle) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, SessionHandle { rx })
    }

    pub fn publish(&self, snapshot: SessionSnapshot) {
        tracing::debug!(
            "Session update: user={:?} loading={}",
            snapshot.user_id(),
            snapshot.loading
        );
        self.tx.send_replace(snapshot);
    }
}

/// Cloneable read-only view of the session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next session update. Returns false once the publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
