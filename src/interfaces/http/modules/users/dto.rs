//! Caller DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    PlatformRole, Principal, PrincipalType, ProjectMemberRole, ProjectType,
};

/// The resolved caller of a request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentPrincipalDto {
    pub id: String,
    /// `USER`, `SERVICE` or `UNKNOWN`
    #[serde(rename = "type")]
    pub kind: String,
    pub project_id: String,
    pub project_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_role: Option<String>,
    /// Effective role in the project, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_role: Option<String>,
    /// Platform the request was attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_platform_id: Option<String>,
}

impl CurrentPrincipalDto {
    pub fn new(
        principal: Principal,
        project_role: Option<ProjectMemberRole>,
        resolved_platform_id: Option<String>,
    ) -> Self {
        let (platform_id, platform_role) = match principal.platform {
            Some(platform) => (
                Some(platform.id),
                Some(platform_role_to_str(platform.role).to_string()),
            ),
            None => (None, None),
        };

        Self {
            id: principal.id,
            kind: principal_type_to_str(principal.kind).to_string(),
            project_id: principal.project_id,
            project_type: project_type_to_str(principal.project_type).to_string(),
            platform_id,
            platform_role,
            project_role: project_role.map(|r| member_role_to_str(r).to_string()),
            resolved_platform_id,
        }
    }
}

fn principal_type_to_str(kind: PrincipalType) -> &'static str {
    match kind {
        PrincipalType::User => "USER",
        PrincipalType::Service => "SERVICE",
        PrincipalType::Unknown => "UNKNOWN",
    }
}

fn platform_role_to_str(role: PlatformRole) -> &'static str {
    match role {
        PlatformRole::Owner => "OWNER",
        PlatformRole::Member => "MEMBER",
    }
}

fn project_type_to_str(project_type: ProjectType) -> &'static str {
    match project_type {
        ProjectType::Standalone => "STANDALONE",
        ProjectType::PlatformManaged => "PLATFORM_MANAGED",
    }
}

fn member_role_to_str(role: ProjectMemberRole) -> &'static str {
    match role {
        ProjectMemberRole::Admin => "ADMIN",
        ProjectMemberRole::Editor => "EDITOR",
        ProjectMemberRole::Operator => "OPERATOR",
        ProjectMemberRole::Viewer => "VIEWER",
    }
}
