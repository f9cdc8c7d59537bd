pub mod manager;
pub mod retry;

pub use manager::{DatabaseError, DatabaseManager};
pub use retry::RetryPolicy;
