//! Tenancy aggregates: platforms, projects and what hangs off them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Standalone,
    PlatformManaged,
}

/// A white-label tenant boundary.
#[derive(Debug, Clone)]
pub struct Platform {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub sso_enabled: bool,
    pub email_auth_enabled: bool,
    pub allowed_auth_domains: Vec<String>,
    pub enforce_allowed_auth_domains: bool,
    pub created_at: DateTime<Utc>,
}

impl Platform {
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Whether an email may authenticate against this platform.
    pub fn allows_email(&self, email: &str) -> bool {
        if !self.enforce_allowed_auth_domains {
            return true;
        }
        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };
        self.allowed_auth_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain))
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub display_name: String,
    pub platform_id: Option<String>,
    pub project_type: ProjectType,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// Hostname → platform mapping.
#[derive(Debug, Clone)]
pub struct CustomDomain {
    pub id: String,
    pub domain: String,
    pub platform_id: String,
    pub created_at: DateTime<Utc>,
}

/// A stored third-party credential; only counted here.
#[derive(Debug, Clone)]
pub struct AppConnection {
    pub id: String,
    pub project_id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
