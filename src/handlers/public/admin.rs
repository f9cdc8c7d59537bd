use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::sources::VerificationError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl VerifyResponse {
    fn valid(is_valid: bool) -> Self {
        Self { is_valid, error: None }
    }

    fn rejected(error: &'static str) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
        }
    }
}

/// Pull a non-empty string `password` out of a JSON body
fn extract_password(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("password") {
        Some(Value::String(password)) if !password.is_empty() => Some(password.clone()),
        _ => None,
    }
}

/// POST /api/verify-admin-password
///
/// Input: `{ "password": "string" }`. Validity is decided entirely by the
/// database procedure; this handler only validates the body and proxies.
pub async fn verify_admin_password(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(password) = extract_password(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyResponse::rejected("Password required")),
        )
            .into_response();
    };

    match state.verifier.verify(&password).await {
        Ok(is_valid) => {
            if !is_valid {
                tracing::warn!("Admin password verification rejected");
            }
            (StatusCode::OK, Json(VerifyResponse::valid(is_valid))).into_response()
        }
        Err(VerificationError::Procedure(msg)) => {
            tracing::error!("Admin password verification error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(VerifyResponse::rejected("Verification failed")),
            )
                .into_response()
        }
        Err(VerificationError::Unexpected(msg)) => {
            tracing::error!("Admin password verification crashed: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(VerifyResponse::rejected("Internal server error")),
            )
                .into_response()
        }
    }
}

/// Any method other than POST/OPTIONS
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(VerifyResponse::rejected("Method not allowed")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_must_be_a_non_empty_string() {
        assert_eq!(extract_password(br#"{"password":"hunter2"}"#), Some("hunter2".to_string()));
        assert_eq!(extract_password(br#"{}"#), None);
        assert_eq!(extract_password(br#"{"password":""}"#), None);
        assert_eq!(extract_password(br#"{"password":42}"#), None);
        assert_eq!(extract_password(br#"{"password":null}"#), None);
        assert_eq!(extract_password(b"not json"), None);
        assert_eq!(extract_password(b""), None);
    }

    #[test]
    fn response_shape_uses_is_valid_key() {
        let body = serde_json::to_value(VerifyResponse::rejected("Password required")).unwrap();
        assert_eq!(body, serde_json::json!({"isValid": false, "error": "Password required"}));

        let body = serde_json::to_value(VerifyResponse::valid(true)).unwrap();
        assert_eq!(body, serde_json::json!({"isValid": true}));
    }
}
