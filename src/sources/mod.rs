//! Collaborators owned by the platform database.
//!
//! Every piece of state the gating pipeline reads from the backend comes
//! through one of these traits, so checkers, stores and handlers can be driven
//! by in-memory fakes in tests.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::business::{BusinessProfile, ContentTemplate};
use crate::database::DatabaseError;
use crate::session::UserId;

pub use postgres::{
    PgAdminPasswordVerifier, PgConfirmationSource, PgProfileSource, PgRoleSource, PgTemplateSource,
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        SourceError::Database(DatabaseError::Sqlx(err))
    }
}

/// Failure modes of the admin password procedure call
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The procedure ran (or was attempted) and reported an error
    #[error("Verification procedure failed: {0}")]
    Procedure(String),

    /// Anything else: misconfiguration, unreachable backend setup
    #[error("Unexpected verification failure: {0}")]
    Unexpected(String),
}

#[async_trait]
pub trait ConfirmationSource: Send + Sync {
    async fn is_email_confirmed(&self, user: UserId) -> Result<bool, SourceError>;
}

#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Raw role tag recorded for the user, if any
    async fn fetch_role(&self, user: UserId) -> Result<Option<String>, SourceError>;
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profiles(&self, user: UserId) -> Result<Vec<BusinessProfile>, SourceError>;
}

#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch_templates(&self) -> Result<Vec<ContentTemplate>, SourceError>;
}

#[async_trait]
pub trait AdminPasswordVerifier: Send + Sync {
    async fn verify(&self, password: &str) -> Result<bool, VerificationError>;
}
