//! Plan service
//!
//! Default plans are created lazily under a per-project lock so concurrent
//! first readers converge on one row. The insert itself keeps an existing
//! row, so instances that do not share a lock still agree on the plan.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{
    ControlPlaneError, DomainResult, Edition, LockService, PlanLimits, Project, ProjectPlan,
    RepositoryProvider,
};

pub struct PlanService {
    repos: Arc<dyn RepositoryProvider>,
    locks: Arc<dyn LockService>,
    edition: Edition,
    lock_timeout: Duration,
}

impl PlanService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        locks: Arc<dyn LockService>,
        edition: Edition,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            repos,
            locks,
            edition,
            lock_timeout,
        }
    }

    pub async fn get_or_create_default_plan(&self, project_id: &str) -> DomainResult<ProjectPlan> {
        if let Some(plan) = self.repos.plans().find_by_project(project_id).await? {
            return Ok(plan);
        }

        let project = self.find_project(project_id).await?;
        let lock = self
            .locks
            .acquire(&format!("project-plan:{}", project_id), self.lock_timeout)
            .await?;

        let result = self.create_default_if_missing(&project).await;

        if let Err(e) = self.locks.release(lock).await {
            warn!(project_id, error = %e, "Failed to release plan lock");
        }
        result
    }

    /// Replace the plan limits, creating the plan when missing. The
    /// subscription start of an existing plan is kept.
    pub async fn update_plan(&self, project_id: &str, limits: PlanLimits) -> DomainResult<ProjectPlan> {
        self.find_project(project_id).await?;

        let now = Utc::now();
        let plan = self
            .repos
            .plans()
            .upsert(new_plan(project_id, limits, now))
            .await?;

        info!(project_id, plan = %plan.name, tasks = plan.tasks, "Plan updated");
        Ok(plan)
    }

    async fn find_project(&self, project_id: &str) -> DomainResult<Project> {
        self.repos
            .projects()
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| ControlPlaneError::not_found("Project", project_id))
    }

    async fn create_default_if_missing(&self, project: &Project) -> DomainResult<ProjectPlan> {
        // Another caller may have created it while we waited for the lock.
        if let Some(plan) = self.repos.plans().find_by_project(&project.id).await? {
            return Ok(plan);
        }

        let limits = PlanLimits::default_for(self.edition, project.project_type);
        let candidate = new_plan(&project.id, limits, Utc::now());
        let candidate_id = candidate.id.clone();
        let plan = self.repos.plans().insert_if_absent(candidate).await?;

        if plan.id == candidate_id {
            info!(project_id = %project.id, plan = %plan.name, "Default plan created");
        }
        Ok(plan)
    }
}

fn new_plan(project_id: &str, limits: PlanLimits, now: chrono::DateTime<Utc>) -> ProjectPlan {
    ProjectPlan {
        id: uuid::Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        name: limits.name,
        tasks: limits.tasks,
        tasks_per_day: limits.tasks_per_day,
        team_members: limits.team_members,
        connections: limits.connections,
        subscription_start_datetime: now,
        updated_at: now,
    }
}
