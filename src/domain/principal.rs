//! Request principal
//!
//! The resolved identity of an inbound request. It doubles as the token
//! payload, so the serde layout is the wire layout of signed tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenancy::ProjectType;

/// Prefix used for the synthesized ids of unauthenticated callers.
pub const ANONYMOUS_PREFIX: &str = "ANONYMOUS_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalType {
    User,
    Service,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformRole {
    Owner,
    Member,
}

/// Tenant context carried by a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformContext {
    pub id: String,
    pub role: PlatformRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PrincipalType,
    pub project_id: String,
    pub project_type: ProjectType,
    /// Absent and `null` both decode to `None`; `None` is never written out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformContext>,
}

impl Principal {
    /// A fresh anonymous principal. Its project id is synthetic and never
    /// names a real project.
    pub fn anonymous() -> Self {
        Self {
            id: format!("{}{}", ANONYMOUS_PREFIX, Uuid::new_v4().simple()),
            kind: PrincipalType::Unknown,
            project_id: format!("{}{}", ANONYMOUS_PREFIX, Uuid::new_v4().simple()),
            project_type: ProjectType::Standalone,
            platform: None,
        }
    }

    pub fn user(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        project_type: ProjectType,
        platform: Option<PlatformContext>,
    ) -> Self {
        Self {
            id: user_id.into(),
            kind: PrincipalType::User,
            project_id: project_id.into(),
            project_type,
            platform,
        }
    }

    /// Service principals always act on behalf of a platform owner.
    pub fn service(
        key_id: impl Into<String>,
        project_id: impl Into<String>,
        project_type: ProjectType,
        platform_id: impl Into<String>,
    ) -> Self {
        Self {
            id: key_id.into(),
            kind: PrincipalType::Service,
            project_id: project_id.into(),
            project_type,
            platform: Some(PlatformContext {
                id: platform_id.into(),
                role: PlatformRole::Owner,
            }),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == PrincipalType::Unknown
    }

    pub fn platform_id(&self) -> Option<&str> {
        self.platform.as_ref().map(|p| p.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_principal_has_synthetic_project() {
        let p = Principal::anonymous();
        assert!(p.is_anonymous());
        assert!(p.id.starts_with(ANONYMOUS_PREFIX));
        assert!(p.project_id.starts_with(ANONYMOUS_PREFIX));
        assert!(p.platform.is_none());
        assert_ne!(p.id, Principal::anonymous().id);
    }

    #[test]
    fn service_principal_always_carries_owner_platform() {
        let p = Principal::service("key-1", "proj-1", ProjectType::PlatformManaged, "plat-1");
        assert_eq!(p.kind, PrincipalType::Service);
        assert_eq!(p.platform_id(), Some("plat-1"));
        assert_eq!(p.platform.unwrap().role, PlatformRole::Owner);
    }

    #[test]
    fn missing_and_null_platform_decode_the_same() {
        let absent: Principal = serde_json::from_value(serde_json::json!({
            "id": "u1", "type": "USER", "projectId": "p1", "projectType": "STANDALONE"
        }))
        .unwrap();
        let null: Principal = serde_json::from_value(serde_json::json!({
            "id": "u1", "type": "USER", "projectId": "p1", "projectType": "STANDALONE",
            "platform": null
        }))
        .unwrap();
        assert_eq!(absent, null);

        let encoded = serde_json::to_value(&absent).unwrap();
        assert!(encoded.get("platform").is_none());
    }
}
