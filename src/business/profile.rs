use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub industry: Option<String>,
    pub compliance_settings: Option<Value>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Structured view of `business_profiles.compliance_settings`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSettings {
    #[serde(default)]
    pub questionnaire_completed: bool,
    #[serde(default)]
    pub regulations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComplianceParse {
    Parsed(ComplianceSettings),
    Missing,
    Malformed(String),
}

/// Parse compliance settings stored either as a JSON object or as a string
/// holding a JSON object. Never fails; bad input yields `Malformed`.
pub fn parse_compliance_settings(raw: Option<&Value>) -> ComplianceParse {
    let value = match raw {
        None | Some(Value::Null) => return ComplianceParse::Missing,
        Some(Value::String(text)) if text.trim().is_empty() => return ComplianceParse::Missing,
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(inner) => inner,
            Err(e) => return ComplianceParse::Malformed(format!("invalid JSON string: {}", e)),
        },
        Some(other) => other.clone(),
    };

    if !value.is_object() {
        return ComplianceParse::Malformed(format!("expected an object, got {}", type_name(&value)));
    }

    match serde_json::from_value::<ComplianceSettings>(value) {
        Ok(settings) => ComplianceParse::Parsed(settings),
        Err(e) => ComplianceParse::Malformed(e.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl BusinessProfile {
    pub fn compliance(&self) -> ComplianceParse {
        parse_compliance_settings(self.compliance_settings.as_ref())
    }

    /// Onboarding questionnaire state. Missing or malformed settings count as not completed.
    pub fn has_completed_questionnaire(&self) -> bool {
        match self.compliance() {
            ComplianceParse::Parsed(settings) => settings.questionnaire_completed,
            ComplianceParse::Missing => false,
            ComplianceParse::Malformed(reason) => {
                tracing::warn!(
                    "Business profile {} has malformed compliance settings: {}",
                    self.id,
                    reason
                );
                false
            }
        }
    }
}
