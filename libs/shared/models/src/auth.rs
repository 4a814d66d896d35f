use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Older tokens carry the user id as `id` instead of `sub`.
    #[serde(alias = "id")]
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub user_metadata: Option<serde_json::Value>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }

    pub fn is_doctor(&self) -> bool {
        self.has_role("doctor")
    }

    /// Name shown on reviews and receipts.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| {
                self.metadata
                    .as_ref()
                    .and_then(|meta| meta.get("name"))
                    .and_then(|name| name.as_str())
                    .map(str::to_string)
            })
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}
