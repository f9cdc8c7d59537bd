use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::filter::{filter_by_business, BusinessScoped};
use super::profile::BusinessProfile;
use crate::session::{Identity, IdentityEpoch, Ticket, UserId};
use crate::sources::{ProfileSource, SourceError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub user_id: Option<UserId>,
    pub profiles: Vec<BusinessProfile>,
    pub active_profile_id: Option<Uuid>,
    pub loading: bool,
    pub has_fetched: bool,
    pub error: Option<String>,
}

impl ProfileState {
    fn for_user(user_id: Option<UserId>) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn active_profile(&self) -> Option<&BusinessProfile> {
        let active = self.active_profile_id?;
        self.profiles.iter().find(|p| p.id == active)
    }
}

/// Keep the previous selection if it survived the refetch, otherwise the
/// primary profile, otherwise the first one.
fn choose_active(profiles: &[BusinessProfile], previous: Option<Uuid>) -> Option<Uuid> {
    previous
        .filter(|id| profiles.iter().any(|p| p.id == *id))
        .or_else(|| profiles.iter().find(|p| p.is_primary).map(|p| p.id))
        .or_else(|| profiles.first().map(|p| p.id))
}

struct Tracked {
    epoch: IdentityEpoch,
    state: ProfileState,
}

struct Inner {
    source: Arc<dyn ProfileSource>,
    tracked: Mutex<Tracked>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Newest fetch wins: each start supersedes any fetch still in flight
    fn begin(&self) -> Option<Ticket> {
        let mut tracked = self.lock();
        let ticket = tracked.epoch.advance()?;
        tracked.state.loading = true;
        Some(ticket)
    }

    fn settle(&self, ticket: Ticket, outcome: Result<Vec<BusinessProfile>, SourceError>) {
        let mut tracked = self.lock();
        if !tracked.epoch.is_current(&ticket) {
            tracing::debug!("Discarding stale business profiles for user {}", ticket.user);
            return;
        }

        let state = &mut tracked.state;
        state.loading = false;
        state.has_fetched = true;
        match outcome {
            Ok(profiles) => {
                state.active_profile_id = choose_active(&profiles, state.active_profile_id);
                tracing::debug!(
                    "Loaded {} business profiles for user {}, active={:?}",
                    profiles.len(),
                    ticket.user,
                    state.active_profile_id
                );
                state.profiles = profiles;
                state.error = None;
            }
            Err(e) => {
                tracing::error!("Failed to fetch business profiles for user {}: {}", ticket.user, e);
                state.profiles.clear();
                state.active_profile_id = None;
                state.error = Some(e.to_string());
            }
        }
    }

    fn spawn_fetch(this: &Arc<Inner>) -> Option<JoinHandle<()>> {
        let ticket = this.begin()?;
        let source = Arc::clone(&this.source);
        let weak: Weak<Inner> = Arc::downgrade(this);

        Some(tokio::spawn(async move {
            let outcome = source.fetch_profiles(ticket.user).await;
            if let Some(inner) = weak.upgrade() {
                inner.settle(ticket, outcome);
            }
        }))
    }
}

/// Business profiles of the signed-in user and the one currently active
#[derive(Clone)]
pub struct ActiveProfileStore {
    inner: Arc<Inner>,
}

impl ActiveProfileStore {
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                tracked: Mutex::new(Tracked {
                    epoch: IdentityEpoch::default(),
                    state: ProfileState::default(),
                }),
            }),
        }
    }

    pub fn set_identity(&self, identity: Option<&Identity>) {
        let user = identity.map(|i| i.id);
        let mut tracked = self.inner.lock();
        if tracked.epoch.rebind(user) {
            tracked.state = ProfileState::for_user(user);
        }
    }

    pub fn state(&self) -> ProfileState {
        self.inner.lock().state.clone()
    }

    pub fn active_profile_id(&self) -> Option<Uuid> {
        self.inner.lock().state.active_profile_id
    }

    pub fn active_profile(&self) -> Option<BusinessProfile> {
        self.inner.lock().state.active_profile().cloned()
    }

    /// Switch the active business. Only profiles owned by the user can be selected.
    pub fn select(&self, profile_id: Uuid) -> bool {
        let mut tracked = self.inner.lock();
        if tracked.state.profiles.iter().any(|p| p.id == profile_id) {
            tracked.state.active_profile_id = Some(profile_id);
            true
        } else {
            tracing::warn!("Refusing to activate unknown business profile {}", profile_id);
            false
        }
    }

    /// Fetch (or refetch) and wait for the result
    pub async fn fetch(&self) {
        let Some(ticket) = self.inner.begin() else {
            return;
        };
        let outcome = self.inner.source.fetch_profiles(ticket.user).await;
        self.inner.settle(ticket, outcome);
    }

    /// Background fetch that tolerates the store being dropped mid-flight
    pub fn spawn_fetch(&self) -> Option<JoinHandle<()>> {
        Inner::spawn_fetch(&self.inner)
    }

    pub fn has_completed_questionnaire(&self) -> bool {
        self.active_profile()
            .map_or(false, |p| p.has_completed_questionnaire())
    }

    /// Scope `items` to the active business (plus shared records)
    pub fn filter_by_business<'a, T>(&self, items: Option<&'a [T]>) -> Vec<&'a T>
    where
        T: BusinessScoped<ProfileId = Uuid>,
    {
        let active = self.active_profile_id();
        filter_by_business(items, active.as_ref())
    }
}
