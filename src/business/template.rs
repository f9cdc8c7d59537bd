use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::filter::BusinessScoped;

/// Publishing template; rows without an owner are the shared library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentTemplate {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub content: Option<String>,
    pub business_profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl BusinessScoped for ContentTemplate {
    type ProfileId = Uuid;

    fn business_profile_id(&self) -> Option<&Uuid> {
        self.business_profile_id.as_ref()
    }
}
