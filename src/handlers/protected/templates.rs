use axum::extract::{Extension, State};
use serde::Serialize;
use uuid::Uuid;

use crate::business::ContentTemplate;
use crate::error::ApiError;
use crate::guard::{AccessGuard, PermissionGuard};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::pipeline;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TemplateListing {
    pub business_profile_id: Option<Uuid>,
    pub templates: Vec<ContentTemplate>,
    pub error: Option<String>,
}

/// GET /api/templates - Templates of the active business plus the shared library
///
/// Requires a confirmed email and `view` on `templates`. A failed fetch
/// yields an empty list with `error` set.
pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
) -> ApiResult<TemplateListing> {
    let context = pipeline::resolve_access(&state, identity).await;

    if !context.email_gate(&state.auth_entry_path, false, "/templates").is_confirmed() {
        return Err(ApiError::forbidden("Email confirmation required"));
    }
    if !PermissionGuard::new("view").on("templates").allows(&context.role) {
        return Err(ApiError::forbidden("Insufficient permissions"));
    }

    let (templates, error) = match state.templates.fetch_templates().await {
        Ok(all) => {
            let visible = context
                .profiles
                .filter_by_business(Some(all.as_slice()))
                .into_iter()
                .cloned()
                .collect();
            (visible, None)
        }
        Err(e) => {
            tracing::error!("Template fetch failed: {}", e);
            (Vec::new(), Some("Failed to load templates".to_string()))
        }
    };

    Ok(ApiResponse::success(TemplateListing {
        business_profile_id: context.profiles.active_profile_id(),
        templates,
        error,
    }))
}
