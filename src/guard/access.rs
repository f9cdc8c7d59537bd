use serde::Serialize;

use crate::role::{ResolvedRole, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Granted,
    Denied,
}

/// Synchronous guard over an already resolved role.
///
/// Same role in, same decision out. Loading belongs to whoever produced the
/// `ResolvedRole`, not to these guards.
pub trait AccessGuard {
    fn allows(&self, access: &ResolvedRole) -> bool;

    fn decide(&self, access: &ResolvedRole) -> AccessDecision {
        if self.allows(access) {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied
        }
    }

    /// Children when allowed, otherwise the fallback (which may be nothing)
    fn render<N>(&self, access: &ResolvedRole, children: N, fallback: Option<N>) -> Option<N>
    where
        Self: Sized,
    {
        match self.decide(access) {
            AccessDecision::Granted => Some(children),
            AccessDecision::Denied => fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGuard {
    pub action: String,
    pub resource: Option<String>,
}

impl PermissionGuard {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: None,
        }
    }

    pub fn on(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl AccessGuard for PermissionGuard {
    fn allows(&self, access: &ResolvedRole) -> bool {
        access.check_permission(&self.action, self.resource.as_deref())
    }
}

/// Allow-list of roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGuard {
    pub roles: Vec<Role>,
}

impl RoleGuard {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }
}

impl AccessGuard for RoleGuard {
    fn allows(&self, access: &ResolvedRole) -> bool {
        access
            .current_user_role
            .map_or(false, |role| self.roles.contains(&role))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminGuard;

impl AccessGuard for AdminGuard {
    fn allows(&self, access: &ResolvedRole) -> bool {
        access.is_admin()
    }
}
