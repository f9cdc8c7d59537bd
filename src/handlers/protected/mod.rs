pub mod session;
pub mod templates;
