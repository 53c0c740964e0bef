//! SeaORM implementations of the tenancy repositories:
//! platforms, projects, custom domains and app connections.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, warn};

use crate::domain::{
    AppConnection, AppConnectionRepository, CustomDomain, CustomDomainRepository, DomainResult,
    Platform, PlatformRepository, Project, ProjectRepository, ProjectType,
};
use crate::infrastructure::database::entities::{app_connection, custom_domain, platform, project};

// ── Conversion helpers ──────────────────────────────────────────

fn platform_to_domain(m: platform::Model) -> Platform {
    let allowed_auth_domains = serde_json::from_str(&m.allowed_auth_domains).unwrap_or_else(|e| {
        warn!(platform_id = %m.id, error = %e, "Unreadable allowed_auth_domains, treating as empty");
        Vec::new()
    });

    Platform {
        id: m.id,
        owner_id: m.owner_id,
        name: m.name,
        sso_enabled: m.sso_enabled,
        email_auth_enabled: m.email_auth_enabled,
        allowed_auth_domains,
        enforce_allowed_auth_domains: m.enforce_allowed_auth_domains,
        created_at: m.created_at,
    }
}

pub(super) fn project_type_to_domain(t: project::ProjectType) -> ProjectType {
    match t {
        project::ProjectType::Standalone => ProjectType::Standalone,
        project::ProjectType::PlatformManaged => ProjectType::PlatformManaged,
    }
}

fn project_type_to_entity(t: ProjectType) -> project::ProjectType {
    match t {
        ProjectType::Standalone => project::ProjectType::Standalone,
        ProjectType::PlatformManaged => project::ProjectType::PlatformManaged,
    }
}

fn project_to_domain(m: project::Model) -> Project {
    Project {
        id: m.id,
        owner_id: m.owner_id,
        display_name: m.display_name,
        platform_id: m.platform_id,
        project_type: project_type_to_domain(m.project_type),
        created_at: m.created_at,
    }
}

// ── SeaOrmPlatformRepository ────────────────────────────────────

pub struct SeaOrmPlatformRepository {
    db: DatabaseConnection,
}

impl SeaOrmPlatformRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlatformRepository for SeaOrmPlatformRepository {
    async fn create(&self, p: Platform) -> DomainResult<()> {
        let domains = serde_json::to_string(&p.allowed_auth_domains)
            .unwrap_or_else(|_| "[]".to_string());

        let model = platform::ActiveModel {
            id: Set(p.id),
            owner_id: Set(p.owner_id),
            name: Set(p.name),
            sso_enabled: Set(p.sso_enabled),
            email_auth_enabled: Set(p.email_auth_enabled),
            allowed_auth_domains: Set(domains),
            enforce_allowed_auth_domains: Set(p.enforce_allowed_auth_domains),
            created_at: Set(p.created_at),
        };
        let saved = model.insert(&self.db).await?;
        debug!(platform_id = %saved.id, "Platform created");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Platform>> {
        let model = platform::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(platform_to_domain))
    }

    async fn find_oldest(&self) -> DomainResult<Option<Platform>> {
        let model = platform::Entity::find()
            .order_by_asc(platform::Column::CreatedAt)
            .order_by_asc(platform::Column::Id)
            .one(&self.db)
            .await?;
        Ok(model.map(platform_to_domain))
    }
}

// ── SeaOrmProjectRepository ─────────────────────────────────────

pub struct SeaOrmProjectRepository {
    db: DatabaseConnection,
}

impl SeaOrmProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepository for SeaOrmProjectRepository {
    async fn create(&self, p: Project) -> DomainResult<()> {
        let model = project::ActiveModel {
            id: Set(p.id),
            owner_id: Set(p.owner_id),
            display_name: Set(p.display_name),
            platform_id: Set(p.platform_id),
            project_type: Set(project_type_to_entity(p.project_type)),
            created_at: Set(p.created_at),
        };
        let saved = model.insert(&self.db).await?;
        debug!(project_id = %saved.id, "Project created");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Project>> {
        let model = project::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(project_to_domain))
    }
}

// ── SeaOrmCustomDomainRepository ────────────────────────────────

pub struct SeaOrmCustomDomainRepository {
    db: DatabaseConnection,
}

impl SeaOrmCustomDomainRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomDomainRepository for SeaOrmCustomDomainRepository {
    async fn create(&self, d: CustomDomain) -> DomainResult<()> {
        let model = custom_domain::ActiveModel {
            id: Set(d.id),
            domain: Set(d.domain.to_ascii_lowercase()),
            platform_id: Set(d.platform_id),
            created_at: Set(d.created_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_domain(&self, domain: &str) -> DomainResult<Option<CustomDomain>> {
        let model = custom_domain::Entity::find()
            .filter(custom_domain::Column::Domain.eq(domain.to_ascii_lowercase()))
            .one(&self.db)
            .await?;

        Ok(model.map(|m| CustomDomain {
            id: m.id,
            domain: m.domain,
            platform_id: m.platform_id,
            created_at: m.created_at,
        }))
    }
}

// ── SeaOrmAppConnectionRepository ───────────────────────────────

pub struct SeaOrmAppConnectionRepository {
    db: DatabaseConnection,
}

impl SeaOrmAppConnectionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppConnectionRepository for SeaOrmAppConnectionRepository {
    async fn create(&self, c: AppConnection) -> DomainResult<()> {
        let model = app_connection::ActiveModel {
            id: Set(c.id),
            project_id: Set(c.project_id),
            display_name: Set(c.display_name),
            created_at: Set(c.created_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn count_by_project(&self, project_id: &str) -> DomainResult<i64> {
        let count = app_connection::Entity::find()
            .filter(app_connection::Column::ProjectId.eq(project_id))
            .count(&self.db)
            .await?;
        Ok(count as i64)
    }
}
