//! Role and permission resolution.
//!
//! Everything here is derived data: no I/O, recomputed on demand from the
//! identity and whatever role record was fetched for it. Anything not listed
//! in the grant table is denied.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::session::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Owner,
    Member,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Publish,
    Manage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    General,
    Calendar,
    Analytics,
    Templates,
    Publishing,
    BusinessProfile,
    Team,
    Billing,
}

/// Resource assumed when a permission check names none
pub const DEFAULT_RESOURCE: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tag '{}'", self.0)
    }
}

impl std::error::Error for UnknownTag {}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }

    pub fn grants(&self, action: Action, resource: Resource) -> bool {
        use Action::*;
        use Resource::*;

        match self {
            Role::Admin => true,
            Role::Owner => match action {
                View | Create | Edit | Delete | Publish => true,
                Manage => matches!(resource, BusinessProfile | Team | Billing),
            },
            Role::Member => match action {
                View => resource != Billing,
                Create | Edit => matches!(resource, General | Calendar | Templates | Publishing),
                Publish => resource == Publishing,
                Delete | Manage => false,
            },
            Role::Viewer => action == View && matches!(resource, General | Calendar | Analytics),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            "member" => Ok(Role::Member),
            "viewer" => Ok(Role::Viewer),
            _ => Err(UnknownTag(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            "publish" => Ok(Action::Publish),
            "manage" => Ok(Action::Manage),
            _ => Err(UnknownTag(s.to_string())),
        }
    }
}

impl FromStr for Resource {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Resource::General),
            "calendar" => Ok(Resource::Calendar),
            "analytics" => Ok(Resource::Analytics),
            "templates" => Ok(Resource::Templates),
            "publishing" => Ok(Resource::Publishing),
            "business_profile" => Ok(Resource::BusinessProfile),
            "team" => Ok(Resource::Team),
            "billing" => Ok(Resource::Billing),
            _ => Err(UnknownTag(s.to_string())),
        }
    }
}

/// Role projection for one identity at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    pub current_user_role: Option<Role>,
}

impl ResolvedRole {
    pub fn new(role: Option<Role>) -> Self {
        Self {
            current_user_role: role,
        }
    }

    /// Derive the role from a fetched role record, falling back to the
    /// token claim. Unrecognised tags resolve to no role.
    pub fn resolve(identity: Option<&Identity>, fetched_role: Option<&str>) -> Self {
        let Some(identity) = identity else {
            return Self::default();
        };

        let tag = fetched_role.or(identity.role_claim.as_deref());
        let role = tag.and_then(|tag| match tag.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!("Ignoring role for user {}: {}", identity.id, e);
                None
            }
        });

        Self::new(role)
    }

    pub fn is_admin(&self) -> bool {
        self.current_user_role == Some(Role::Admin)
    }

    /// `resource` defaults to "general". Unknown role, action or resource is denied.
    pub fn check_permission(&self, action: &str, resource: Option<&str>) -> bool {
        let Some(role) = self.current_user_role else {
            return false;
        };
        let (Ok(action), Ok(resource)) = (
            action.parse::<Action>(),
            resource.unwrap_or(DEFAULT_RESOURCE).parse::<Resource>(),
        ) else {
            return false;
        };
        role.grants(action, resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const ROLES: [Role; 4] = [Role::Admin, Role::Owner, Role::Member, Role::Viewer];
    const ACTIONS: [&str; 6] = ["view", "create", "edit", "delete", "publish", "manage"];
    const RESOURCES: [&str; 8] = [
        "general",
        "calendar",
        "analytics",
        "templates",
        "publishing",
        "business_profile",
        "team",
        "billing",
    ];

    #[test]
    fn resolve_prefers_fetched_role_over_claim() {
        let identity = Identity::new(Uuid::new_v4()).with_role_claim("viewer");
        assert_eq!(
            ResolvedRole::resolve(Some(&identity), Some("owner")).current_user_role,
            Some(Role::Owner)
        );
        assert_eq!(
            ResolvedRole::resolve(Some(&identity), None).current_user_role,
            Some(Role::Viewer)
        );
    }

    #[test]
    fn resolve_without_identity_or_with_unknown_tag_is_empty() {
        assert_eq!(ResolvedRole::resolve(None, Some("admin")), ResolvedRole::default());

        let identity = Identity::new(Uuid::new_v4());
        assert_eq!(ResolvedRole::resolve(Some(&identity), Some("superuser")).current_user_role, None);
        assert_eq!(ResolvedRole::resolve(Some(&identity), None).current_user_role, None);
    }

    #[test]
    fn only_admin_is_admin() {
        assert!(ResolvedRole::new(Some(Role::Admin)).is_admin());
        for role in [Role::Owner, Role::Member, Role::Viewer] {
            assert!(!ResolvedRole::new(Some(role)).is_admin());
        }
        assert!(!ResolvedRole::default().is_admin());
    }

    #[test]
    fn resource_defaults_to_general() {
        let viewer = ResolvedRole::new(Some(Role::Viewer));
        assert!(viewer.check_permission("view", None));
        assert!(!viewer.check_permission("edit", None));
    }

    #[test]
    fn unknown_inputs_are_denied_for_every_role() {
        for role in ROLES {
            let resolved = ResolvedRole::new(Some(role));
            assert!(!resolved.check_permission("launch", None));
            assert!(!resolved.check_permission("view", Some("patients_raw")));
            assert!(!resolved.check_permission("", Some("")));
            assert!(!resolved.check_permission("VIEW", None));
        }
    }

    #[test]
    fn no_role_denies_everything() {
        let nobody = ResolvedRole::default();
        for action in ACTIONS {
            for resource in RESOURCES {
                assert!(!nobody.check_permission(action, Some(resource)));
            }
        }
    }

    #[test]
    fn grants_match_table() {
        let admin = ResolvedRole::new(Some(Role::Admin));
        let owner = ResolvedRole::new(Some(Role::Owner));
        let member = ResolvedRole::new(Some(Role::Member));
        let viewer = ResolvedRole::new(Some(Role::Viewer));

        for action in ACTIONS {
            for resource in RESOURCES {
                assert!(admin.check_permission(action, Some(resource)));
            }
        }

        assert!(owner.check_permission("delete", Some("calendar")));
        assert!(owner.check_permission("manage", Some("team")));
        assert!(!owner.check_permission("manage", Some("analytics")));

        assert!(member.check_permission("publish", Some("publishing")));
        assert!(member.check_permission("edit", Some("templates")));
        assert!(!member.check_permission("view", Some("billing")));
        assert!(!member.check_permission("delete", Some("templates")));
        assert!(!member.check_permission("publish", Some("templates")));

        assert!(viewer.check_permission("view", Some("analytics")));
        assert!(!viewer.check_permission("view", Some("team")));
        assert!(!viewer.check_permission("create", Some("calendar")));
    }

    #[test]
    fn role_tags_parse_case_insensitively() {
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Member.to_string(), "member");
    }
}
