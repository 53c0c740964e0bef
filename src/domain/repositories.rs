//! Repository traits for the domain layer
//!
//! Contains:
//! - one repository trait per aggregate
//! - `RepositoryProvider`: unified access to all of them

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::api_key::ApiKey;
use super::billing::{ProjectPlan, ProjectUsage};
use super::member::ProjectMember;
use super::tenancy::{AppConnection, CustomDomain, Platform, Project};
use crate::shared::DomainResult;

#[async_trait]
pub trait PlatformRepository: Send + Sync {
    async fn create(&self, platform: Platform) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Platform>>;
    /// The first platform ever created; the default tenant of
    /// single-tenant deployments.
    async fn find_oldest(&self) -> DomainResult<Option<Platform>>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: Project) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Project>>;
}

#[async_trait]
pub trait ProjectMemberRepository: Send + Sync {
    /// Insert, or update role/status/user of the row with the same
    /// `(project_id, email)`.
    async fn upsert(&self, member: ProjectMember) -> DomainResult<ProjectMember>;
    async fn find_by_user(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> DomainResult<Option<ProjectMember>>;
    async fn count_active(&self, project_id: &str) -> DomainResult<i64>;
}

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn create(&self, key: ApiKey) -> DomainResult<()>;
    async fn find_by_hash(&self, key_hash: &str) -> DomainResult<Option<ApiKey>>;
    async fn touch_last_used(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()>;
}

#[async_trait]
pub trait CustomDomainRepository: Send + Sync {
    async fn create(&self, domain: CustomDomain) -> DomainResult<()>;
    async fn find_by_domain(&self, domain: &str) -> DomainResult<Option<CustomDomain>>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_by_project(&self, project_id: &str) -> DomainResult<Option<ProjectPlan>>;
    /// Insert unless the project already has a plan; returns the stored
    /// plan either way.
    async fn insert_if_absent(&self, plan: ProjectPlan) -> DomainResult<ProjectPlan>;
    /// Insert, or overwrite the limits of the plan with the same project id.
    async fn upsert(&self, plan: ProjectPlan) -> DomainResult<ProjectPlan>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// The row with the latest reset time.
    async fn find_latest(&self, project_id: &str) -> DomainResult<Option<ProjectUsage>>;
    async fn find_window(
        &self,
        project_id: &str,
        next_reset: DateTime<Utc>,
    ) -> DomainResult<Option<ProjectUsage>>;
    /// Insert unless a row for the same `(project_id, next_reset_datetime)`
    /// already exists.
    async fn insert_if_absent(&self, usage: ProjectUsage) -> DomainResult<()>;
    /// Single-statement `consumed_tasks = consumed_tasks + tasks`; returns
    /// the counter as left by this increment.
    async fn increment_consumed(&self, usage_id: &str, tasks: i64) -> DomainResult<i64>;
}

#[async_trait]
pub trait AppConnectionRepository: Send + Sync {
    async fn create(&self, connection: AppConnection) -> DomainResult<()>;
    async fn count_by_project(&self, project_id: &str) -> DomainResult<i64>;
}

/// Execution history, summed per day for the daily cap.
#[async_trait]
pub trait TaskRunRepository: Send + Sync {
    async fn record(&self, project_id: &str, tasks: i64, at: DateTime<Utc>) -> DomainResult<()>;
    async fn sum_tasks_since(&self, project_id: &str, since: DateTime<Utc>) -> DomainResult<i64>;
}

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let project = repos.projects().find_by_id("p1").await?;
///     let plan = repos.plans().find_by_project("p1").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn platforms(&self) -> &dyn PlatformRepository;
    fn projects(&self) -> &dyn ProjectRepository;
    fn project_members(&self) -> &dyn ProjectMemberRepository;
    fn api_keys(&self) -> &dyn ApiKeyRepository;
    fn custom_domains(&self) -> &dyn CustomDomainRepository;
    fn plans(&self) -> &dyn PlanRepository;
    fn usages(&self) -> &dyn UsageRepository;
    fn app_connections(&self) -> &dyn AppConnectionRepository;
    fn task_runs(&self) -> &dyn TaskRunRepository;
}
