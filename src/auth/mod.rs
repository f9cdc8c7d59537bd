use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::session::Identity;

/// Claims of an access token issued by the platform auth service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    pub exp: i64,
    pub iat: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    pub role: Option<String>,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub.into(),
            email: self.email.clone(),
            role_claim: self.app_metadata.role.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Invalid JWT token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub audience: String,
}

impl JwtSettings {
    pub fn from_config(security: &SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.clone(),
            audience: security.jwt_audience.clone(),
        }
    }

    /// Validate signature, expiry and audience, then return the claims
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.as_str()]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}
