//! Email confirmation checker.
//!
//! One remote check per identity at a time. Results that arrive after the
//! identity changed, or after every handle to the checker was dropped, are
//! discarded. Failures leave the user unconfirmed.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;

use crate::session::{Identity, IdentityEpoch, SessionHandle, Ticket, UserId};
use crate::sources::{ConfirmationSource, SourceError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmationState {
    /// Identity this state describes
    pub user_id: Option<UserId>,
    pub is_confirmed: bool,
    pub is_checking: bool,
    /// At least one check finished for `user_id`
    pub has_checked: bool,
    pub error: Option<String>,
}

impl ConfirmationState {
    fn for_user(user_id: Option<UserId>) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}

struct Tracked {
    epoch: IdentityEpoch,
    state: ConfirmationState,
}

struct Inner {
    source: Arc<dyn ConfirmationSource>,
    tracked: Mutex<Tracked>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rebind(&self, user: Option<UserId>) {
        let mut tracked = self.lock();
        if tracked.epoch.rebind(user) {
            tracing::debug!("Confirmation state reset for user {:?}", user);
            tracked.state = ConfirmationState::for_user(user);
        }
    }

    /// Claim the in-flight slot for the current identity
    fn begin(&self) -> Option<Ticket> {
        let mut tracked = self.lock();
        let ticket = tracked.epoch.ticket()?;
        if tracked.state.is_checking {
            return None;
        }
        tracked.state.is_checking = true;
        Some(ticket)
    }

    fn settle(&self, ticket: Ticket, outcome: Result<bool, SourceError>) {
        let mut tracked = self.lock();
        if !tracked.epoch.is_current(&ticket) {
            tracing::debug!("Discarding stale confirmation result for user {}", ticket.user);
            return;
        }

        let state = &mut tracked.state;
        state.is_checking = false;
        state.has_checked = true;
        match outcome {
            Ok(confirmed) => {
                state.is_confirmed = confirmed;
                state.error = None;
            }
            Err(e) => {
                tracing::warn!("Email confirmation check failed for user {}: {}", ticket.user, e);
                state.is_confirmed = false;
                state.error = Some(e.to_string());
            }
        }
    }

    /// Give up the in-flight slot without a result
    fn release(&self, ticket: &Ticket) {
        let mut tracked = self.lock();
        if tracked.epoch.is_current(ticket) {
            tracing::debug!("Confirmation check for user {} was cancelled", ticket.user);
            tracked.state.is_checking = false;
        }
    }

    fn spawn_check(this: &Arc<Inner>) -> Option<JoinHandle<()>> {
        let pending = PendingCheck::start(this)?;
        let source = Arc::clone(&this.source);

        Some(tokio::spawn(async move {
            let outcome = source.is_email_confirmed(pending.ticket.user).await;
            pending.settle(outcome);
        }))
    }
}

/// A claimed in-flight slot. Dropped before `settle` (timeout, select,
/// aborted task), it hands the slot back so the next check can run.
struct PendingCheck {
    inner: Weak<Inner>,
    ticket: Ticket,
    settled: bool,
}

impl PendingCheck {
    fn start(inner: &Arc<Inner>) -> Option<Self> {
        let ticket = inner.begin()?;
        Some(Self {
            inner: Arc::downgrade(inner),
            ticket,
            settled: false,
        })
    }

    fn settle(mut self, outcome: Result<bool, SourceError>) {
        self.settled = true;
        match self.inner.upgrade() {
            Some(inner) => inner.settle(self.ticket, outcome),
            None => tracing::debug!(
                "Confirmation checker dropped before result for {}",
                self.ticket.user
            ),
        }
    }
}

impl Drop for PendingCheck {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.release(&self.ticket);
        }
    }
}

#[derive(Clone)]
pub struct ConfirmationChecker {
    inner: Arc<Inner>,
}

impl ConfirmationChecker {
    pub fn new(source: Arc<dyn ConfirmationSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                tracked: Mutex::new(Tracked {
                    epoch: IdentityEpoch::default(),
                    state: ConfirmationState::default(),
                }),
            }),
        }
    }

    /// Point the checker at a (possibly different) identity.
    /// Changing identity resets the state and orphans any in-flight check.
    pub fn set_identity(&self, identity: Option<&Identity>) {
        self.inner.rebind(identity.map(|i| i.id));
    }

    pub fn state(&self) -> ConfirmationState {
        self.inner.lock().state.clone()
    }

    pub fn is_email_confirmed(&self) -> bool {
        self.inner.lock().state.is_confirmed
    }

    pub fn is_checking_confirmation(&self) -> bool {
        self.inner.lock().state.is_checking
    }

    /// Check the current identity's confirmation and wait for the result.
    /// No identity, or a check already running for it, makes this a no-op.
    pub async fn check_email_confirmation(&self) {
        let Some(pending) = PendingCheck::start(&self.inner) else {
            return;
        };
        let outcome = self.inner.source.is_email_confirmed(pending.ticket.user).await;
        pending.settle(outcome);
    }

    /// Fire-and-forget variant. The task holds only a weak reference, so
    /// dropping the checker mid-flight turns the result into a no-op.
    pub fn spawn_check(&self) -> Option<JoinHandle<()>> {
        Inner::spawn_check(&self.inner)
    }

    /// Track a session: once it stops loading, rebind on every change and
    /// re-check. Ends when the session publisher or the checker goes away.
    pub fn follow(&self, mut session: SessionHandle) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                let snapshot = session.snapshot();
                {
                    let Some(inner) = weak.upgrade() else { break };
                    if !snapshot.loading {
                        inner.rebind(snapshot.user_id());
                        Inner::spawn_check(&inner);
                    }
                }
                if !session.changed().await {
                    break;
                }
            }
        })
    }
}
