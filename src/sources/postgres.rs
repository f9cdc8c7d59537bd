use async_trait::async_trait;

use super::{
    AdminPasswordVerifier, ConfirmationSource, ProfileSource, RoleSource, SourceError,
    TemplateSource, VerificationError,
};
use crate::business::{BusinessProfile, ContentTemplate};
use crate::database::{DatabaseError, DatabaseManager, RetryPolicy};
use crate::session::UserId;

/// Reads `auth.users.email_confirmed_at`
pub struct PgConfirmationSource {
    retry: RetryPolicy,
}

impl PgConfirmationSource {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl ConfirmationSource for PgConfirmationSource {
    async fn is_email_confirmed(&self, user: UserId) -> Result<bool, SourceError> {
        self.retry
            .run("email confirmation lookup", move || async move {
                let pool = DatabaseManager::pool().await?;
                let confirmed: Option<bool> = sqlx::query_scalar(
                    "SELECT email_confirmed_at IS NOT NULL FROM auth.users WHERE id = $1",
                )
                .bind(user.0)
                .fetch_optional(&pool)
                .await?;

                // Unknown user counts as unconfirmed
                Ok::<bool, SourceError>(confirmed.unwrap_or(false))
            })
            .await
    }
}

pub struct PgRoleSource {
    retry: RetryPolicy,
}

impl PgRoleSource {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl RoleSource for PgRoleSource {
    async fn fetch_role(&self, user: UserId) -> Result<Option<String>, SourceError> {
        self.retry
            .run("role lookup", move || async move {
                let pool = DatabaseManager::pool().await?;
                let role: Option<String> = sqlx::query_scalar(
                    "SELECT role FROM user_roles WHERE user_id = $1 LIMIT 1",
                )
                .bind(user.0)
                .fetch_optional(&pool)
                .await?;
                Ok::<Option<String>, SourceError>(role)
            })
            .await
    }
}

pub struct PgProfileSource {
    retry: RetryPolicy,
}

impl PgProfileSource {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl ProfileSource for PgProfileSource {
    async fn fetch_profiles(&self, user: UserId) -> Result<Vec<BusinessProfile>, SourceError> {
        let query = r#"
            SELECT
                id, user_id, business_name, industry,
                compliance_settings, is_primary, created_at
            FROM business_profiles
            WHERE user_id = $1
            ORDER BY is_primary DESC, created_at ASC
        "#;

        self.retry
            .run("business profile fetch", move || async move {
                let pool = DatabaseManager::pool().await?;
                let profiles = sqlx::query_as::<_, BusinessProfile>(query)
                    .bind(user.0)
                    .fetch_all(&pool)
                    .await?;
                Ok::<Vec<BusinessProfile>, SourceError>(profiles)
            })
            .await
    }
}

pub struct PgTemplateSource {
    retry: RetryPolicy,
}

impl PgTemplateSource {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl TemplateSource for PgTemplateSource {
    async fn fetch_templates(&self) -> Result<Vec<ContentTemplate>, SourceError> {
        let query = r#"
            SELECT id, name, category, content, business_profile_id, created_at
            FROM content_templates
            ORDER BY created_at ASC
        "#;

        self.retry
            .run("template fetch", move || async move {
                let pool = DatabaseManager::pool().await?;
                let templates = sqlx::query_as::<_, ContentTemplate>(query)
                    .fetch_all(&pool)
                    .await?;
                Ok::<Vec<ContentTemplate>, SourceError>(templates)
            })
            .await
    }
}

/// Delegates password checks to a privileged database procedure that
/// returns rows shaped `(is_valid boolean)`. Holds no password logic itself.
pub struct PgAdminPasswordVerifier {
    procedure: String,
}

impl PgAdminPasswordVerifier {
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
        }
    }
}

#[async_trait]
impl AdminPasswordVerifier for PgAdminPasswordVerifier {
    async fn verify(&self, password: &str) -> Result<bool, VerificationError> {
        if !DatabaseManager::is_valid_identifier(&self.procedure) {
            return Err(VerificationError::Unexpected(format!(
                "invalid procedure name '{}'",
                self.procedure
            )));
        }

        let pool = DatabaseManager::pool().await.map_err(|e| match e {
            DatabaseError::Sqlx(e) => VerificationError::Procedure(e.to_string()),
            other => VerificationError::Unexpected(other.to_string()),
        })?;

        let query = format!("SELECT is_valid FROM {}($1)", self.procedure);
        let rows: Vec<Option<bool>> = sqlx::query_scalar(&query)
            .bind(password)
            .fetch_all(&pool)
            .await
            .map_err(|e| VerificationError::Procedure(e.to_string()))?;

        // First row decides; no rows means not valid
        Ok(rows.first().copied().flatten().unwrap_or(false))
    }
}
