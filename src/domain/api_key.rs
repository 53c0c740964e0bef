use chrono::{DateTime, Utc};

/// Platform-scoped API key. Only the hash of the secret is stored.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: String,
    pub platform_id: String,
    pub display_name: String,
    pub key_hash: String,
    pub truncated_value: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
