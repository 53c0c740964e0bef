//! Static permission tables
//!
//! permission → (resource, HTTP methods) and role → permissions.

use crate::domain::ProjectMemberRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadFlow,
    WriteFlow,
    UpdateFlowStatus,
    ReadAppConnection,
    WriteAppConnection,
    ReadRun,
    RetryRun,
    ReadFolder,
    WriteFolder,
    ReadTable,
    WriteTable,
    ReadProjectMember,
    WriteProjectMember,
    ReadInvitation,
    WriteInvitation,
}

const READ: &[&str] = &["GET", "HEAD", "OPTIONS"];
const WRITE: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];
const POST: &[&str] = &["POST"];

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ReadFlow,
        Permission::WriteFlow,
        Permission::UpdateFlowStatus,
        Permission::ReadAppConnection,
        Permission::WriteAppConnection,
        Permission::ReadRun,
        Permission::RetryRun,
        Permission::ReadFolder,
        Permission::WriteFolder,
        Permission::ReadTable,
        Permission::WriteTable,
        Permission::ReadProjectMember,
        Permission::WriteProjectMember,
        Permission::ReadInvitation,
        Permission::WriteInvitation,
    ];

    /// The resource this permission gates and the methods it allows on it.
    pub fn grant(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::ReadFlow => ("flows", READ),
            Self::WriteFlow => ("flows", WRITE),
            Self::UpdateFlowStatus => ("flows", POST),
            Self::ReadAppConnection => ("app-connections", READ),
            Self::WriteAppConnection => ("app-connections", WRITE),
            Self::ReadRun => ("flow-runs", READ),
            Self::RetryRun => ("flow-runs", POST),
            Self::ReadFolder => ("folders", READ),
            Self::WriteFolder => ("folders", WRITE),
            Self::ReadTable => ("tables", READ),
            Self::WriteTable => ("tables", WRITE),
            Self::ReadProjectMember => ("project-members", READ),
            Self::WriteProjectMember => ("project-members", WRITE),
            Self::ReadInvitation => ("user-invitations", READ),
            Self::WriteInvitation => ("user-invitations", WRITE),
        }
    }

    pub fn allows(&self, resource: &str, method: &str) -> bool {
        let (granted_resource, methods) = self.grant();
        granted_resource == resource && methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Whether the engine gates this resource at all.
pub fn is_managed_resource(resource: &str) -> bool {
    Permission::ALL.iter().any(|p| p.grant().0 == resource)
}

pub fn role_permissions(role: ProjectMemberRole) -> &'static [Permission] {
    use Permission::*;

    match role {
        ProjectMemberRole::Admin => Permission::ALL,
        ProjectMemberRole::Editor => &[
            ReadFlow,
            WriteFlow,
            UpdateFlowStatus,
            ReadAppConnection,
            WriteAppConnection,
            ReadRun,
            RetryRun,
            ReadFolder,
            WriteFolder,
            ReadTable,
            WriteTable,
            ReadProjectMember,
            ReadInvitation,
        ],
        ProjectMemberRole::Operator => &[
            ReadFlow,
            UpdateFlowStatus,
            ReadAppConnection,
            WriteAppConnection,
            ReadRun,
            RetryRun,
            ReadFolder,
            ReadTable,
            ReadProjectMember,
            ReadInvitation,
        ],
        ProjectMemberRole::Viewer => &[
            ReadFlow,
            ReadAppConnection,
            ReadRun,
            ReadFolder,
            ReadTable,
            ReadProjectMember,
            ReadInvitation,
        ],
    }
}

/// First path segment after the `/v{n}` prefix.
pub fn resource_from_path(path: &str) -> Option<&str> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let version = segments.next()?;
    let is_version = version
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
    if !is_version {
        return None;
    }
    segments.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_is_the_segment_after_the_version() {
        assert_eq!(resource_from_path("/v1/flows/abc"), Some("flows"));
        assert_eq!(resource_from_path("/v12/tables"), Some("tables"));
        assert_eq!(resource_from_path("/v1"), None);
        assert_eq!(resource_from_path("/docs/index.html"), None);
    }

    #[test]
    fn write_flow_allows_create_and_delete_only() {
        assert!(Permission::WriteFlow.allows("flows", "POST"));
        assert!(Permission::WriteFlow.allows("flows", "delete"));
        assert!(!Permission::WriteFlow.allows("flows", "GET"));
        assert!(!Permission::WriteFlow.allows("tables", "POST"));
    }

    #[test]
    fn read_covers_head_and_options() {
        for method in ["GET", "HEAD", "OPTIONS"] {
            assert!(Permission::ReadFlow.allows("flows", method));
        }
        assert!(!Permission::ReadFlow.allows("flows", "POST"));
    }

    #[test]
    fn viewer_cannot_write_anything() {
        for permission in role_permissions(ProjectMemberRole::Viewer) {
            let (resource, _) = permission.grant();
            assert!(!permission.allows(resource, "POST"), "{:?}", permission);
        }
    }

    #[test]
    fn only_admins_manage_members() {
        for role in [
            ProjectMemberRole::Editor,
            ProjectMemberRole::Operator,
            ProjectMemberRole::Viewer,
        ] {
            assert!(!role_permissions(role).contains(&Permission::WriteProjectMember));
        }
        assert!(role_permissions(ProjectMemberRole::Admin).contains(&Permission::WriteProjectMember));
    }

    #[test]
    fn unmanaged_resources_are_recognized() {
        assert!(is_managed_resource("flows"));
        assert!(!is_managed_resource("usage"));
        assert!(!is_managed_resource("users"));
    }
}
