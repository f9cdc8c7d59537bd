use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Lazily connected pool for the platform database
pub struct DatabaseManager {
    pool: OnceCell<PgPool>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pool: OnceCell::new(),
        })
    }

    /// Get the platform pool, connecting on first use.
    /// A failed connection attempt is not cached; the next caller tries again.
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        let pool = Self::instance()
            .pool
            .get_or_try_init(|| async {
                let connection_string = Self::connection_string()?;
                let settings = &config::config().database;

                let pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(Duration::from_secs(settings.connection_timeout))
                    .connect(&connection_string)
                    .await?;

                info!("Created platform database pool");
                Ok::<PgPool, DatabaseError>(pool)
            })
            .await?;

        Ok(pool.clone())
    }

    fn connection_string() -> Result<String, DatabaseError> {
        let base = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let url = url::Url::parse(&base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }
        Ok(url.into())
    }

    /// Close the pool if it was ever opened (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = Self::instance().pool.get() {
            pool.close().await;
            info!("Closed platform database pool");
        }
    }

    /// Validate identifiers that get interpolated into SQL (procedure names).
    /// Accepts an optional schema prefix: `schema.name`, each part [a-zA-Z_][a-zA-Z0-9_]*
    pub fn is_valid_identifier(name: &str) -> bool {
        let mut parts = name.split('.');
        let valid_part = |part: &str| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                }
                _ => false,
            }
        };
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => valid_part(name),
            (Some(schema), Some(name), None) => valid_part(schema) && valid_part(name),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_identifiers() {
        assert!(DatabaseManager::is_valid_identifier("verify_admin_password"));
        assert!(DatabaseManager::is_valid_identifier("public.verify_admin_password"));
        assert!(!DatabaseManager::is_valid_identifier("verify-admin"));
        assert!(!DatabaseManager::is_valid_identifier("1verify"));
        assert!(!DatabaseManager::is_valid_identifier("a.b.c"));
        assert!(!DatabaseManager::is_valid_identifier("verify(); DROP TABLE users"));
        assert!(!DatabaseManager::is_valid_identifier(""));
    }
}
