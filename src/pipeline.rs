//! Request-scoped run of the gating pipeline for one authenticated identity.

use crate::business::ActiveProfileStore;
use crate::confirmation::{ConfirmationChecker, ConfirmationState};
use crate::guard::{EmailConfirmationGuard, EmailGate};
use crate::role::ResolvedRole;
use crate::session::{Identity, SessionSnapshot};
use crate::state::AppState;

pub struct AccessContext {
    pub session: SessionSnapshot,
    pub role: ResolvedRole,
    pub confirmation: ConfirmationState,
    pub profiles: ActiveProfileStore,
}

impl AccessContext {
    pub fn email_gate(
        &self,
        auth_entry_path: &str,
        is_healthcare_professional: bool,
        location: &str,
    ) -> EmailGate {
        EmailConfirmationGuard::new(auth_entry_path)
            .healthcare_professional(is_healthcare_professional)
            .evaluate(&self.session, &self.confirmation, location)
    }
}

/// Role lookup that fails closed: a failed fetch yields no role at all
/// rather than falling back to the token claim.
pub async fn resolve_role(state: &AppState, identity: &Identity) -> ResolvedRole {
    match state.roles.fetch_role(identity.id).await {
        Ok(tag) => ResolvedRole::resolve(Some(identity), tag.as_deref()),
        Err(e) => {
            tracing::warn!("Role lookup failed for user {}: {}", identity.id, e);
            ResolvedRole::default()
        }
    }
}

/// Confirmation check, profile fetch and role lookup run concurrently
pub async fn resolve_access(state: &AppState, identity: Identity) -> AccessContext {
    let session = SessionSnapshot::signed_in(identity.clone());

    let checker = ConfirmationChecker::new(state.confirmations.clone());
    checker.set_identity(session.user.as_ref());

    let profiles = ActiveProfileStore::new(state.profiles.clone());
    profiles.set_identity(session.user.as_ref());

    let ((), (), role) = tokio::join!(
        checker.check_email_confirmation(),
        profiles.fetch(),
        resolve_role(state, &identity),
    );

    AccessContext {
        session,
        role,
        confirmation: checker.state(),
        profiles,
    }
}
