//! SeaORM implementations of PlanRepository, UsageRepository and
//! TaskRunRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::{
    ControlPlaneError, DomainResult, PlanRepository, ProjectPlan, ProjectUsage, TaskRunRepository,
    UsageRepository,
};
use crate::infrastructure::database::entities::{project_plan, project_usage, task_run};

// ── Conversion helpers ──────────────────────────────────────────

fn plan_to_domain(m: project_plan::Model) -> ProjectPlan {
    ProjectPlan {
        id: m.id,
        project_id: m.project_id,
        name: m.name,
        tasks: m.tasks,
        tasks_per_day: m.tasks_per_day,
        team_members: m.team_members,
        connections: m.connections,
        subscription_start_datetime: m.subscription_start_datetime,
        updated_at: m.updated_at,
    }
}

fn plan_to_active(p: ProjectPlan) -> project_plan::ActiveModel {
    project_plan::ActiveModel {
        id: Set(p.id),
        project_id: Set(p.project_id),
        name: Set(p.name),
        tasks: Set(p.tasks),
        tasks_per_day: Set(p.tasks_per_day),
        team_members: Set(p.team_members),
        connections: Set(p.connections),
        subscription_start_datetime: Set(p.subscription_start_datetime),
        updated_at: Set(p.updated_at),
    }
}

fn usage_to_domain(m: project_usage::Model) -> ProjectUsage {
    ProjectUsage {
        id: m.id,
        project_id: m.project_id,
        consumed_tasks: m.consumed_tasks,
        next_reset_datetime: m.next_reset_datetime,
    }
}

// ── SeaOrmPlanRepository ────────────────────────────────────────

pub struct SeaOrmPlanRepository {
    db: DatabaseConnection,
}

impl SeaOrmPlanRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanRepository for SeaOrmPlanRepository {
    async fn find_by_project(&self, project_id: &str) -> DomainResult<Option<ProjectPlan>> {
        let model = project_plan::Entity::find()
            .filter(project_plan::Column::ProjectId.eq(project_id))
            .one(&self.db)
            .await?;
        Ok(model.map(plan_to_domain))
    }

    async fn insert_if_absent(&self, plan: ProjectPlan) -> DomainResult<ProjectPlan> {
        let project_id = plan.project_id.clone();

        let result = project_plan::Entity::insert(plan_to_active(plan))
            .on_conflict(
                OnConflict::column(project_plan::Column::ProjectId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => {
                debug!(%project_id, "Plan already exists, keeping the stored row");
            }
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }

        self.find_by_project(&project_id)
            .await?
            .ok_or_else(|| ControlPlaneError::not_found("ProjectPlan", project_id))
    }

    async fn upsert(&self, plan: ProjectPlan) -> DomainResult<ProjectPlan> {
        let project_id = plan.project_id.clone();

        project_plan::Entity::insert(plan_to_active(plan))
            .on_conflict(
                OnConflict::column(project_plan::Column::ProjectId)
                    .update_columns([
                        project_plan::Column::Name,
                        project_plan::Column::Tasks,
                        project_plan::Column::TasksPerDay,
                        project_plan::Column::TeamMembers,
                        project_plan::Column::Connections,
                        project_plan::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find_by_project(&project_id)
            .await?
            .ok_or_else(|| ControlPlaneError::not_found("ProjectPlan", project_id))
    }
}

// ── SeaOrmUsageRepository ───────────────────────────────────────

pub struct SeaOrmUsageRepository {
    db: DatabaseConnection,
}

impl SeaOrmUsageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UsageRepository for SeaOrmUsageRepository {
    async fn find_latest(&self, project_id: &str) -> DomainResult<Option<ProjectUsage>> {
        let model = project_usage::Entity::find()
            .filter(project_usage::Column::ProjectId.eq(project_id))
            .order_by_desc(project_usage::Column::NextResetDatetime)
            .one(&self.db)
            .await?;
        Ok(model.map(usage_to_domain))
    }

    async fn find_window(
        &self,
        project_id: &str,
        next_reset: DateTime<Utc>,
    ) -> DomainResult<Option<ProjectUsage>> {
        let model = project_usage::Entity::find()
            .filter(project_usage::Column::ProjectId.eq(project_id))
            .filter(project_usage::Column::NextResetDatetime.eq(next_reset))
            .one(&self.db)
            .await?;
        Ok(model.map(usage_to_domain))
    }

    async fn insert_if_absent(&self, usage: ProjectUsage) -> DomainResult<()> {
        let model = project_usage::ActiveModel {
            id: Set(usage.id),
            project_id: Set(usage.project_id),
            consumed_tasks: Set(usage.consumed_tasks),
            next_reset_datetime: Set(usage.next_reset_datetime),
        };

        let result = project_usage::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    project_usage::Column::ProjectId,
                    project_usage::Column::NextResetDatetime,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => {
                debug!("Usage window already exists, keeping the stored row");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn increment_consumed(&self, usage_id: &str, tasks: i64) -> DomainResult<i64> {
        // The row stays write-locked until commit, so the read sees exactly
        // this increment on top of every earlier one.
        let txn = self.db.begin().await?;

        let result = project_usage::Entity::update_many()
            .col_expr(
                project_usage::Column::ConsumedTasks,
                Expr::col(project_usage::Column::ConsumedTasks).add(tasks),
            )
            .filter(project_usage::Column::Id.eq(usage_id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ControlPlaneError::not_found("ProjectUsage", usage_id));
        }

        let consumed = project_usage::Entity::find_by_id(usage_id.to_string())
            .one(&txn)
            .await?
            .map(|m| m.consumed_tasks)
            .ok_or_else(|| ControlPlaneError::not_found("ProjectUsage", usage_id))?;

        txn.commit().await?;
        Ok(consumed)
    }
}

// ── SeaOrmTaskRunRepository ─────────────────────────────────────

pub struct SeaOrmTaskRunRepository {
    db: DatabaseConnection,
}

impl SeaOrmTaskRunRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRunRepository for SeaOrmTaskRunRepository {
    async fn record(&self, project_id: &str, tasks: i64, at: DateTime<Utc>) -> DomainResult<()> {
        let model = task_run::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            project_id: Set(project_id.to_string()),
            tasks: Set(tasks),
            created_at: Set(at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn sum_tasks_since(&self, project_id: &str, since: DateTime<Utc>) -> DomainResult<i64> {
        let total: Option<Option<i64>> = task_run::Entity::find()
            .select_only()
            .column_as(task_run::Column::Tasks.sum(), "total")
            .filter(task_run::Column::ProjectId.eq(project_id))
            .filter(task_run::Column::CreatedAt.gte(since))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }
}
