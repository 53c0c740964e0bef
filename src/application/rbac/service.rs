//! RBAC engine
//!
//! Single entry point for project-role authorization. Ownership is checked
//! here before the member table, so callers never special-case owners.

use std::sync::Arc;

use tracing::debug;

use super::permissions::{is_managed_resource, resource_from_path, role_permissions};
use crate::domain::{
    ControlPlaneError, DomainResult, Edition, MemberStatus, PlatformRole, Principal,
    ProjectMemberRole, RepositoryProvider,
};

pub struct RbacService {
    repos: Arc<dyn RepositoryProvider>,
    edition: Edition,
}

impl RbacService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, edition: Edition) -> Self {
        Self { repos, edition }
    }

    /// Allow or deny `method` on the resource named by `path`.
    pub async fn authorize(&self, principal: &Principal, method: &str, path: &str) -> DomainResult<()> {
        if !self.edition.supports_multi_role() {
            return Ok(());
        }

        let Some(resource) = resource_from_path(path) else {
            return Ok(());
        };
        if !is_managed_resource(resource) {
            return Ok(());
        }

        let denied = || ControlPlaneError::PermissionDenied {
            resource: resource.to_string(),
            action: method.to_ascii_uppercase(),
        };

        let Some(role) = self.role_of(principal).await? else {
            debug!(principal_id = %principal.id, resource, "No project role");
            return Err(denied());
        };

        if role_permissions(role).iter().any(|p| p.allows(resource, method)) {
            Ok(())
        } else {
            debug!(principal_id = %principal.id, ?role, resource, method, "Role lacks permission");
            Err(denied())
        }
    }

    /// The principal's role in its own project. Owners of the project or of
    /// the project's platform are always `Admin`.
    pub async fn role_of(&self, principal: &Principal) -> DomainResult<Option<ProjectMemberRole>> {
        if principal.is_anonymous() {
            return Ok(None);
        }

        let Some(project) = self.repos.projects().find_by_id(&principal.project_id).await? else {
            return Ok(None);
        };

        if project.is_owner(&principal.id) {
            return Ok(Some(ProjectMemberRole::Admin));
        }

        if let (Some(platform), Some(project_platform)) = (&principal.platform, &project.platform_id) {
            if platform.role == PlatformRole::Owner && &platform.id == project_platform {
                return Ok(Some(ProjectMemberRole::Admin));
            }
        }

        let member = self
            .repos
            .project_members()
            .find_by_user(&project.id, &principal.id)
            .await?;

        Ok(member
            .filter(|m| m.status == MemberStatus::Active)
            .map(|m| m.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlatformContext, ProjectType};
    use crate::infrastructure::database::fixtures;

    fn user(id: &str) -> Principal {
        Principal::user(
            id,
            "p1",
            ProjectType::PlatformManaged,
            Some(PlatformContext {
                id: "plat-1".into(),
                role: PlatformRole::Member,
            }),
        )
    }

    async fn engine(edition: Edition) -> RbacService {
        let repos = fixtures::repositories().await;
        fixtures::seed_managed_project(repos.as_ref()).await;
        repos
            .project_members()
            .upsert(fixtures::member("p1", "viewer-1", ProjectMemberRole::Viewer))
            .await
            .unwrap();
        repos
            .project_members()
            .upsert(fixtures::member("p1", "editor-1", ProjectMemberRole::Editor))
            .await
            .unwrap();
        RbacService::new(repos, edition)
    }

    #[tokio::test]
    async fn owner_is_admin_without_a_member_row() {
        let rbac = engine(Edition::Enterprise).await;
        let owner = user("owner-1");

        assert_eq!(rbac.role_of(&owner).await.unwrap(), Some(ProjectMemberRole::Admin));
        rbac.authorize(&owner, "POST", "/v1/project-members").await.unwrap();
        rbac.authorize(&owner, "DELETE", "/v1/flows/f1").await.unwrap();
    }

    #[tokio::test]
    async fn owner_may_send_preflight_requests() {
        let rbac = engine(Edition::Enterprise).await;
        let owner = user("owner-1");

        rbac.authorize(&owner, "OPTIONS", "/v1/flows").await.unwrap();
        rbac.authorize(&owner, "OPTIONS", "/v1/project-members").await.unwrap();
    }

    #[tokio::test]
    async fn platform_owner_and_service_keys_are_admin() {
        let rbac = engine(Edition::Cloud).await;
        let platform_owner = Principal::user(
            "platform-owner",
            "p1",
            ProjectType::PlatformManaged,
            Some(PlatformContext {
                id: "plat-1".into(),
                role: PlatformRole::Owner,
            }),
        );
        let service = Principal::service("key-1", "p1", ProjectType::PlatformManaged, "plat-1");

        for principal in [platform_owner, service] {
            rbac.authorize(&principal, "POST", "/v1/project-members").await.unwrap();
        }
    }

    #[tokio::test]
    async fn owner_of_another_platform_is_not_admin() {
        let rbac = engine(Edition::Cloud).await;
        let stranger = Principal::service("key-9", "p1", ProjectType::PlatformManaged, "plat-9");

        let err = rbac.authorize(&stranger, "GET", "/v1/flows").await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn member_without_a_row_is_denied() {
        let rbac = engine(Edition::Enterprise).await;
        let err = rbac.authorize(&user("nobody"), "GET", "/v1/flows").await.unwrap_err();

        match err {
            ControlPlaneError::PermissionDenied { resource, action } => {
                assert_eq!(resource, "flows");
                assert_eq!(action, "GET");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn roles_are_checked_against_the_permission_table() {
        let rbac = engine(Edition::Enterprise).await;

        rbac.authorize(&user("viewer-1"), "GET", "/v1/flows").await.unwrap();
        assert!(rbac.authorize(&user("viewer-1"), "POST", "/v1/flows").await.is_err());

        rbac.authorize(&user("editor-1"), "POST", "/v1/flows").await.unwrap();
        assert!(rbac
            .authorize(&user("editor-1"), "POST", "/v1/project-members")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unmanaged_resources_are_allowed() {
        let rbac = engine(Edition::Enterprise).await;
        rbac.authorize(&user("nobody"), "POST", "/v1/usage/tasks").await.unwrap();
        rbac.authorize(&user("nobody"), "GET", "/docs").await.unwrap();
    }

    #[tokio::test]
    async fn community_edition_skips_rbac() {
        let rbac = engine(Edition::Community).await;
        rbac.authorize(&user("nobody"), "DELETE", "/v1/flows/f1").await.unwrap();
    }

    #[tokio::test]
    async fn pending_members_have_no_role() {
        let rbac = engine(Edition::Enterprise).await;
        let mut pending = fixtures::member("p1", "pending-1", ProjectMemberRole::Editor);
        pending.status = MemberStatus::Pending;
        rbac.repos.project_members().upsert(pending).await.unwrap();

        assert_eq!(rbac.role_of(&user("pending-1")).await.unwrap(), None);
    }
}
