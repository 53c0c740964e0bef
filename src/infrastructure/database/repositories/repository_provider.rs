//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    ApiKeyRepository, AppConnectionRepository, CustomDomainRepository, PlanRepository,
    PlatformRepository, ProjectMemberRepository, ProjectRepository, RepositoryProvider,
    TaskRunRepository, UsageRepository,
};

use super::api_key_repository::SeaOrmApiKeyRepository;
use super::billing_repository::{
    SeaOrmPlanRepository, SeaOrmTaskRunRepository, SeaOrmUsageRepository,
};
use super::member_repository::SeaOrmProjectMemberRepository;
use super::tenancy_repository::{
    SeaOrmAppConnectionRepository, SeaOrmCustomDomainRepository, SeaOrmPlatformRepository,
    SeaOrmProjectRepository,
};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let project = repos.projects().find_by_id("p1").await?;
/// let usage = repos.usages().find_latest("p1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    platforms: SeaOrmPlatformRepository,
    projects: SeaOrmProjectRepository,
    project_members: SeaOrmProjectMemberRepository,
    api_keys: SeaOrmApiKeyRepository,
    custom_domains: SeaOrmCustomDomainRepository,
    plans: SeaOrmPlanRepository,
    usages: SeaOrmUsageRepository,
    app_connections: SeaOrmAppConnectionRepository,
    task_runs: SeaOrmTaskRunRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            platforms: SeaOrmPlatformRepository::new(db.clone()),
            projects: SeaOrmProjectRepository::new(db.clone()),
            project_members: SeaOrmProjectMemberRepository::new(db.clone()),
            api_keys: SeaOrmApiKeyRepository::new(db.clone()),
            custom_domains: SeaOrmCustomDomainRepository::new(db.clone()),
            plans: SeaOrmPlanRepository::new(db.clone()),
            usages: SeaOrmUsageRepository::new(db.clone()),
            app_connections: SeaOrmAppConnectionRepository::new(db.clone()),
            task_runs: SeaOrmTaskRunRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn platforms(&self) -> &dyn PlatformRepository {
        &self.platforms
    }

    fn projects(&self) -> &dyn ProjectRepository {
        &self.projects
    }

    fn project_members(&self) -> &dyn ProjectMemberRepository {
        &self.project_members
    }

    fn api_keys(&self) -> &dyn ApiKeyRepository {
        &self.api_keys
    }

    fn custom_domains(&self) -> &dyn CustomDomainRepository {
        &self.custom_domains
    }

    fn plans(&self) -> &dyn PlanRepository {
        &self.plans
    }

    fn usages(&self) -> &dyn UsageRepository {
        &self.usages
    }

    fn app_connections(&self) -> &dyn AppConnectionRepository {
        &self.app_connections
    }

    fn task_runs(&self) -> &dyn TaskRunRepository {
        &self.task_runs
    }
}
