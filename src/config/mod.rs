use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Retry policy shared by every data fetch. Configured once, never per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub auth_entry_path: String,
    pub verify_procedure: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Lowercase environment name reported by the health endpoint
    pub fn environment_name(&self) -> &'static str {
        match self.environment {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Retry overrides
        if let Ok(v) = env::var("RETRY_MAX_RETRIES") {
            self.retry.max_retries = v.parse().unwrap_or(self.retry.max_retries);
        }
        if let Ok(v) = env::var("RETRY_BASE_DELAY_MS") {
            self.retry.base_delay_ms = v.parse().unwrap_or(self.retry.base_delay_ms);
        }
        if let Ok(v) = env::var("RETRY_MAX_DELAY_MS") {
            self.retry.max_delay_ms = v.parse().unwrap_or(self.retry.max_delay_ms);
        }

        // API overrides
        if let Some(port) = env::var("CAREFLOW_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_AUDIENCE") {
            self.security.jwt_audience = v;
        }
        if let Ok(v) = env::var("SECURITY_AUTH_ENTRY_PATH") {
            self.security.auth_entry_path = v;
        }
        if let Ok(v) = env::var("SECURITY_VERIFY_PROCEDURE") {
            self.security.verify_procedure = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 1000,
                max_delay_ms: 30_000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "careflow-development-secret".to_string(),
                jwt_audience: "authenticated".to_string(),
                auth_entry_path: "/auth".to_string(),
                verify_procedure: "verify_admin_password".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 1000,
                max_delay_ms: 30_000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                // Must come from SECURITY_JWT_SECRET
                jwt_secret: String::new(),
                jwt_audience: "authenticated".to_string(),
                auth_entry_path: "/auth".to_string(),
                verify_procedure: "verify_admin_password".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 1000,
                max_delay_ms: 30_000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_audience: "authenticated".to_string(),
                auth_entry_path: "/auth".to_string(),
                verify_procedure: "verify_admin_password".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
