// Two security tiers:
// Public (no auth) → Protected (Bearer JWT via jwt_auth_middleware)
pub mod protected;
pub mod public;
