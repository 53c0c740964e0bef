//! Usage DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{ProjectPlan, UsageSummary};

/// Plan limits as shown to tenants
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanDto {
    pub name: String,
    /// Tasks per 30-day window
    pub tasks: i64,
    pub tasks_per_day: Option<i64>,
    pub team_members: i64,
    pub connections: i64,
    pub subscription_start_datetime: DateTime<Utc>,
}

impl From<ProjectPlan> for PlanDto {
    fn from(plan: ProjectPlan) -> Self {
        Self {
            name: plan.name,
            tasks: plan.tasks,
            tasks_per_day: plan.tasks_per_day,
            team_members: plan.team_members,
            connections: plan.connections,
            subscription_start_datetime: plan.subscription_start_datetime,
        }
    }
}

/// Current window usage with live counts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsageDto {
    pub project_id: String,
    pub consumed_tasks: i64,
    pub tasks_today: i64,
    pub team_members: i64,
    pub connections: i64,
    pub next_reset_datetime: DateTime<Utc>,
    pub plan: PlanDto,
}

impl UsageDto {
    pub fn new(usage: UsageSummary, plan: ProjectPlan) -> Self {
        Self {
            project_id: usage.project_id,
            consumed_tasks: usage.consumed_tasks,
            tasks_today: usage.tasks_today,
            team_members: usage.team_members,
            connections: usage.connections,
            next_reset_datetime: usage.next_reset_datetime,
            plan: plan.into(),
        }
    }
}

/// Record executed tasks
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordTasksRequest {
    #[validate(range(min = 1, max = 1000000, message = "must be between 1 and 1000000"))]
    pub tasks: i64,
}
