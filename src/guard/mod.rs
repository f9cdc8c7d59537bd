pub mod access;
pub mod auth;
pub mod email;

pub use access::{AccessDecision, AccessGuard, AdminGuard, PermissionGuard, RoleGuard};
pub use auth::AuthGuard;
pub use email::{EmailConfirmationGuard, EmailGate, GatedView};
