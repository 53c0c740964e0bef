//! Seed data for tests that run against the in-memory database.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::{test_database, SeaOrmRepositoryProvider};
use crate::domain::{
    MemberStatus, Platform, Project, ProjectMember, ProjectMemberRole, ProjectType,
    RepositoryProvider,
};

pub async fn repositories() -> Arc<SeaOrmRepositoryProvider> {
    Arc::new(SeaOrmRepositoryProvider::new(test_database().await))
}

pub fn platform(id: &str, owner_id: &str, created_at: DateTime<Utc>) -> Platform {
    Platform {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        name: format!("{} platform", id),
        sso_enabled: false,
        email_auth_enabled: true,
        allowed_auth_domains: Vec::new(),
        enforce_allowed_auth_domains: false,
        created_at,
    }
}

pub fn project(id: &str, owner_id: &str, platform_id: Option<&str>) -> Project {
    Project {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        display_name: format!("{} project", id),
        platform_id: platform_id.map(str::to_string),
        project_type: if platform_id.is_some() {
            ProjectType::PlatformManaged
        } else {
            ProjectType::Standalone
        },
        created_at: Utc::now(),
    }
}

pub fn member(project_id: &str, user_id: &str, role: ProjectMemberRole) -> ProjectMember {
    ProjectMember {
        id: uuid::Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        user_id: Some(user_id.to_string()),
        email: format!("{}@example.com", user_id),
        role,
        status: MemberStatus::Active,
        created_at: Utc::now(),
    }
}

/// Platform `plat-1` owned by `platform-owner`, holding project `p1` owned
/// by `owner-1`.
pub async fn seed_managed_project(repos: &dyn RepositoryProvider) {
    repos
        .platforms()
        .create(platform("plat-1", "platform-owner", Utc::now() - Duration::days(1)))
        .await
        .unwrap();
    repos
        .projects()
        .create(project("p1", "owner-1", Some("plat-1")))
        .await
        .unwrap();
}

/// Project `p1` owned by `owner-1`, outside any platform.
pub async fn seed_standalone_project(repos: &dyn RepositoryProvider) {
    repos
        .projects()
        .create(project("p1", "owner-1", None))
        .await
        .unwrap();
}
