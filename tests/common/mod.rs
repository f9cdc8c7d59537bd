#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use chrono::{TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use careflow_gate::auth::JwtSettings;
use careflow_gate::business::{BusinessProfile, ContentTemplate};
use careflow_gate::routes;
use careflow_gate::session::UserId;
use careflow_gate::sources::{
    AdminPasswordVerifier, ConfirmationSource, ProfileSource, RoleSource, SourceError,
    TemplateSource, VerificationError,
};
use careflow_gate::state::AppState;

/// Server process owned by one test; killed when the test drops it
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Development preset, no database: only endpoints that never reach
        // Postgres are exercised against the real binary
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_careflow-gate"));
        cmd.env("CAREFLOW_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env_remove("PORT")
            .env_remove("DATABASE_URL")
            .env_remove("SECURITY_JWT_SECRET")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/api/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub const TEST_SECRET: &str = "integration-test-secret";
pub const AUDIENCE: &str = "authenticated";

/// Every backend lookup the router makes, answered from memory
#[derive(Clone, Default)]
pub struct FakeBackend {
    /// `None` makes the confirmation lookup fail
    pub email_confirmed: Option<bool>,
    pub role: Option<String>,
    pub role_fails: bool,
    pub profiles: Vec<BusinessProfile>,
    /// `None` makes the template fetch fail
    pub templates: Option<Vec<ContentTemplate>>,
    /// `None` makes the verification procedure fail
    pub admin_password: Option<String>,
    /// Verifier fails outside the procedure, e.g. a bad procedure name
    pub verifier_crashes: bool,
}

impl FakeBackend {
    pub fn confirmed(role: &str) -> Self {
        Self {
            email_confirmed: Some(true),
            role: Some(role.to_string()),
            templates: Some(Vec::new()),
            admin_password: Some("correct horse".to_string()),
            ..Self::default()
        }
    }

    pub fn app(self) -> Router {
        let backend = Arc::new(self);
        routes::app(AppState {
            confirmations: backend.clone(),
            roles: backend.clone(),
            profiles: backend.clone(),
            templates: backend.clone(),
            verifier: backend,
            jwt: JwtSettings {
                secret: TEST_SECRET.to_string(),
                audience: AUDIENCE.to_string(),
            },
            auth_entry_path: "/auth".to_string(),
            environment: "test".to_string(),
            request_logging: false,
        })
    }
}

fn lookup_failed() -> SourceError {
    sqlx::Error::PoolTimedOut.into()
}

#[async_trait]
impl ConfirmationSource for FakeBackend {
    async fn is_email_confirmed(&self, _user: UserId) -> Result<bool, SourceError> {
        self.email_confirmed.ok_or_else(lookup_failed)
    }
}

#[async_trait]
impl RoleSource for FakeBackend {
    async fn fetch_role(&self, _user: UserId) -> Result<Option<String>, SourceError> {
        if self.role_fails {
            return Err(lookup_failed());
        }
        Ok(self.role.clone())
    }
}

#[async_trait]
impl ProfileSource for FakeBackend {
    async fn fetch_profiles(&self, user: UserId) -> Result<Vec<BusinessProfile>, SourceError> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.user_id == user.0)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TemplateSource for FakeBackend {
    async fn fetch_templates(&self) -> Result<Vec<ContentTemplate>, SourceError> {
        self.templates.clone().ok_or_else(lookup_failed)
    }
}

#[async_trait]
impl AdminPasswordVerifier for FakeBackend {
    async fn verify(&self, password: &str) -> Result<bool, VerificationError> {
        if self.verifier_crashes {
            return Err(VerificationError::Unexpected(
                "invalid procedure name 'verify-admin'".to_string(),
            ));
        }
        match &self.admin_password {
            Some(expected) => Ok(expected == password),
            None => Err(VerificationError::Procedure(
                "function verify_admin_password does not exist".to_string(),
            )),
        }
    }
}

pub fn profile(user: Uuid, name: &str, is_primary: bool, compliance: Option<Value>) -> BusinessProfile {
    BusinessProfile {
        id: Uuid::new_v4(),
        user_id: user,
        business_name: name.to_string(),
        industry: Some("dental".to_string()),
        compliance_settings: compliance,
        is_primary,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

pub fn template(name: &str, business_profile_id: Option<Uuid>) -> ContentTemplate {
    ContentTemplate {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: Some("reminder".to_string()),
        content: Some(format!("{} body", name)),
        business_profile_id,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

/// Access token signed with the in-process router's secret
pub fn token_for(user: Uuid, role_claim: Option<&str>) -> String {
    let now = Utc::now().timestamp();
    let mut claims = json!({
        "sub": user,
        "email": "clinician@example.com",
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 3600,
    });
    if let Some(role) = role_claim {
        claims["app_metadata"] = json!({ "role": role });
    }
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes()))
        .expect("token encodes")
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request builds")
}

/// Drive one request through the router and decode the JSON body
pub async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}
