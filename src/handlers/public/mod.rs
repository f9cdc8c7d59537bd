pub mod admin;
pub mod health;

use axum::http::StatusCode;

/// CORS preflight short-circuit: empty 200
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
