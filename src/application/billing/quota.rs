//! Quota gate
//!
//! Blocks work only on a confirmed over-limit. Any other failure while
//! evaluating the gate is logged, counted and treated as "allow".

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use super::plan::PlanService;
use super::usage::UsageService;
use crate::domain::{ControlPlaneError, DomainResult, Edition, RepositoryProvider};
use crate::shared::QuotaMetric;

pub struct QuotaGate {
    repos: Arc<dyn RepositoryProvider>,
    plans: Arc<PlanService>,
    usage: Arc<UsageService>,
    edition: Edition,
}

impl QuotaGate {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        plans: Arc<PlanService>,
        usage: Arc<UsageService>,
        edition: Edition,
    ) -> Self {
        Self {
            repos,
            plans,
            usage,
            edition,
        }
    }

    /// Gate further task execution. The daily cap is checked before the
    /// window cap.
    pub async fn limit(&self, project_id: &str) -> DomainResult<()> {
        self.enforce(project_id, QuotaMetric::Tasks, self.check_tasks(project_id))
            .await
    }

    /// Gate inviting another member. The owner counts as one.
    pub async fn check_team_members(&self, project_id: &str) -> DomainResult<()> {
        self.enforce(project_id, QuotaMetric::TeamMembers, async {
            let plan = self.plans.get_or_create_default_plan(project_id).await?;
            let members = self.repos.project_members().count_active(project_id).await? + 1;
            exceeded_if(members >= plan.team_members, QuotaMetric::TeamMembers, plan.team_members)
        })
        .await
    }

    /// Gate creating another app connection.
    pub async fn check_connections(&self, project_id: &str) -> DomainResult<()> {
        self.enforce(project_id, QuotaMetric::Connections, async {
            let plan = self.plans.get_or_create_default_plan(project_id).await?;
            let connections = self.repos.app_connections().count_by_project(project_id).await?;
            exceeded_if(connections >= plan.connections, QuotaMetric::Connections, plan.connections)
        })
        .await
    }

    async fn check_tasks(&self, project_id: &str) -> DomainResult<()> {
        let plan = self.plans.get_or_create_default_plan(project_id).await?;
        let now = Utc::now();

        if let Some(per_day) = plan.tasks_per_day {
            let today = self.usage.tasks_today(project_id, now).await?;
            exceeded_if(today >= per_day, QuotaMetric::Tasks, per_day)?;
        }

        let usage = self.usage.current_usage(&plan, now).await?;
        exceeded_if(usage.consumed_tasks >= plan.tasks, QuotaMetric::Tasks, plan.tasks)
    }

    async fn enforce(
        &self,
        project_id: &str,
        metric: QuotaMetric,
        check: impl Future<Output = DomainResult<()>>,
    ) -> DomainResult<()> {
        if !self.edition.has_billing() {
            return Ok(());
        }

        match check.await {
            Ok(()) => Ok(()),
            Err(err @ ControlPlaneError::QuotaExceeded { .. }) => {
                metrics::counter!("quota_exceeded_total", "metric" => metric.as_str()).increment(1);
                info!(project_id, %metric, "Quota exceeded");
                Err(err)
            }
            Err(e) => {
                metrics::counter!("quota_gate_errors_total", "metric" => metric.as_str()).increment(1);
                error!(project_id, %metric, error = %e, "Quota check failed, allowing");
                Ok(())
            }
        }
    }
}

fn exceeded_if(over: bool, metric: QuotaMetric, quota: i64) -> DomainResult<()> {
    if over {
        Err(ControlPlaneError::QuotaExceeded { metric, quota })
    } else {
        Ok(())
    }
}
