use axum::extract::{Extension, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard::{AccessGuard, AdminGuard, EmailGate, PermissionGuard};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::pipeline;
use crate::role::{Role, DEFAULT_RESOURCE};
use crate::session::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    /// Route the client is trying to open; echoed back as the post-login return target
    pub location: Option<String>,
    #[serde(default)]
    pub healthcare: bool,
}

#[derive(Debug, Serialize)]
pub struct AccessSummary {
    pub user_id: UserId,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_admin: bool,
    pub email_gate: EmailGate,
    pub confirmation_error: Option<String>,
    pub active_business_profile_id: Option<Uuid>,
    pub questionnaire_completed: bool,
    pub profile_error: Option<String>,
}

/// GET /api/session/access - Resolve role, email gate and business context
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user_id": "uuid",
///     "role": "member",
///     "is_admin": false,
///     "email_gate": { "state": "confirmed" },
///     "active_business_profile_id": "uuid",
///     "questionnaire_completed": true
///   }
/// }
/// ```
pub async fn access(
    State(state): State<AppState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    Query(query): Query<AccessQuery>,
) -> ApiResult<AccessSummary> {
    let context = pipeline::resolve_access(&state, identity.clone()).await;
    let location = query.location.as_deref().unwrap_or("/");
    let email_gate = context.email_gate(&state.auth_entry_path, query.healthcare, location);
    let profile_state = context.profiles.state();

    tracing::debug!(
        "Access for {}: role={:?} gate={:?}",
        identity.id,
        context.role.current_user_role,
        email_gate
    );

    Ok(ApiResponse::success(AccessSummary {
        user_id: identity.id,
        email: identity.email,
        role: context.role.current_user_role,
        is_admin: AdminGuard.allows(&context.role),
        email_gate,
        confirmation_error: context.confirmation.error,
        active_business_profile_id: profile_state.active_profile_id,
        questionnaire_completed: context.profiles.has_completed_questionnaire(),
        profile_error: profile_state.error,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PermissionQuery {
    pub action: Option<String>,
    pub resource: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionAnswer {
    pub action: String,
    pub resource: String,
    pub allowed: bool,
}

/// GET /api/session/permission?action=&resource= - single permission check
pub async fn permission(
    State(state): State<AppState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    Query(query): Query<PermissionQuery>,
) -> ApiResult<PermissionAnswer> {
    let action = query
        .action
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter 'action' is required"))?;
    let resource = query.resource.unwrap_or_else(|| DEFAULT_RESOURCE.to_string());

    let role = pipeline::resolve_role(&state, &identity).await;
    let allowed = PermissionGuard::new(action.clone()).on(resource.clone()).allows(&role);

    Ok(ApiResponse::success(PermissionAnswer {
        action,
        resource,
        allowed,
    }))
}
