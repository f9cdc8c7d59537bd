use std::sync::Arc;

use crate::auth::JwtSettings;
use crate::config::AppConfig;
use crate::database::RetryPolicy;
use crate::sources::{
    AdminPasswordVerifier, ConfirmationSource, PgAdminPasswordVerifier, PgConfirmationSource,
    PgProfileSource, PgRoleSource, PgTemplateSource, ProfileSource, RoleSource, TemplateSource,
};

/// Handles shared by every request. Sources are injected explicitly so the
/// router can run against fakes.
#[derive(Clone)]
pub struct AppState {
    pub confirmations: Arc<dyn ConfirmationSource>,
    pub roles: Arc<dyn RoleSource>,
    pub profiles: Arc<dyn ProfileSource>,
    pub templates: Arc<dyn TemplateSource>,
    pub verifier: Arc<dyn AdminPasswordVerifier>,
    pub jwt: JwtSettings,
    pub auth_entry_path: String,
    pub environment: String,
    pub request_logging: bool,
}

impl AppState {
    /// Postgres-backed state with the global retry policy
    pub fn from_config(config: &AppConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);

        Self {
            confirmations: Arc::new(PgConfirmationSource::new(retry)),
            roles: Arc::new(PgRoleSource::new(retry)),
            profiles: Arc::new(PgProfileSource::new(retry)),
            templates: Arc::new(PgTemplateSource::new(retry)),
            verifier: Arc::new(PgAdminPasswordVerifier::new(config.security.verify_procedure.clone())),
            jwt: JwtSettings::from_config(&config.security),
            auth_entry_path: config.security.auth_entry_path.clone(),
            environment: config.environment_name().to_string(),
            request_logging: config.api.enable_request_logging,
        }
    }
}
