use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectMemberRole {
    Admin,
    Editor,
    Operator,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Pending,
    Active,
}

/// A non-owner user's role within a project. Owners are never stored here.
#[derive(Debug, Clone)]
pub struct ProjectMember {
    pub id: String,
    pub project_id: String,
    pub user_id: Option<String>,
    pub email: String,
    pub role: ProjectMemberRole,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}
