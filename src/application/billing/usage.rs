//! Usage service
//!
//! Reads the current window's usage (rolling it over when the window has
//! moved on) and records consumption with an atomic increment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::alerts::UsageAlerts;
use super::plan::PlanService;
use super::window::{next_reset, start_of_day};
use crate::domain::{
    ControlPlaneError, DomainResult, ProjectPlan, ProjectUsage, RepositoryProvider, UsageSummary,
};

pub struct UsageService {
    repos: Arc<dyn RepositoryProvider>,
    plans: Arc<PlanService>,
    alerts: Arc<UsageAlerts>,
}

impl UsageService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        plans: Arc<PlanService>,
        alerts: Arc<UsageAlerts>,
    ) -> Self {
        Self {
            repos,
            plans,
            alerts,
        }
    }

    pub fn plans(&self) -> &Arc<PlanService> {
        &self.plans
    }

    /// Usage of the current window plus live member, connection and
    /// today's task counts.
    pub async fn get_usage_by_project_id(&self, project_id: &str) -> DomainResult<UsageSummary> {
        let plan = self.plans.get_or_create_default_plan(project_id).await?;
        let now = Utc::now();
        let usage = self.current_usage(&plan, now).await?;

        let active_members = self.repos.project_members().count_active(project_id).await?;
        let connections = self.repos.app_connections().count_by_project(project_id).await?;
        let tasks_today = self.tasks_today(project_id, now).await?;

        Ok(UsageSummary {
            id: usage.id,
            project_id: usage.project_id,
            consumed_tasks: usage.consumed_tasks,
            next_reset_datetime: usage.next_reset_datetime,
            // The owner is never stored as a member row.
            team_members: active_members + 1,
            connections,
            tasks_today,
        })
    }

    /// Record `tasks` executed tasks. Alerts are checked in the background
    /// over the step this call moved the counter by, so concurrent callers
    /// cover disjoint ranges and each crossing fires once.
    pub async fn add_tasks_consumed(&self, project_id: &str, tasks: i64) -> DomainResult<()> {
        if tasks <= 0 {
            debug!(project_id, tasks, "Ignoring non-positive task count");
            return Ok(());
        }

        let plan = self.plans.get_or_create_default_plan(project_id).await?;
        let now = Utc::now();
        let usage = self.current_usage(&plan, now).await?;

        let new = self.repos.usages().increment_consumed(&usage.id, tasks).await?;
        let old = new.saturating_sub(tasks);

        let alerts = self.alerts.clone();
        tokio::spawn(async move {
            alerts.check(&plan, old, new).await;
        });

        self.repos.task_runs().record(project_id, tasks, now).await?;

        debug!(project_id, tasks, consumed = new, usage_id = %usage.id, "Tasks consumed");
        Ok(())
    }

    pub(crate) async fn tasks_today(&self, project_id: &str, now: DateTime<Utc>) -> DomainResult<i64> {
        self.repos
            .task_runs()
            .sum_tasks_since(project_id, start_of_day(now))
            .await
    }

    /// The usage row of the window containing `now`, created zeroed when
    /// the stored latest row belongs to an earlier window.
    pub(crate) async fn current_usage(
        &self,
        plan: &ProjectPlan,
        now: DateTime<Utc>,
    ) -> DomainResult<ProjectUsage> {
        let next = next_reset(plan.subscription_start_datetime, now);
        let usages = self.repos.usages();

        if let Some(latest) = usages.find_latest(&plan.project_id).await? {
            if latest.next_reset_datetime == next {
                return Ok(latest);
            }
        }

        usages
            .insert_if_absent(ProjectUsage {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: plan.project_id.clone(),
                consumed_tasks: 0,
                next_reset_datetime: next,
            })
            .await?;

        let usage = usages
            .find_window(&plan.project_id, next)
            .await?
            .ok_or_else(|| ControlPlaneError::Internal("usage window vanished after insert".into()))?;

        debug!(project_id = %plan.project_id, next_reset = %next, "Usage window opened");
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::{Edition, Notification, Notifier, PlanLimits};
    use crate::infrastructure::database::fixtures;
    use crate::infrastructure::MemoryLockService;

    struct RecordingNotifier(mpsc::UnboundedSender<Notification>);

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: Notification) -> DomainResult<()> {
            let _ = self.0.send(notification);
            Ok(())
        }
    }

    struct Harness {
        usage: Arc<UsageService>,
        repos: Arc<dyn RepositoryProvider>,
        sent: mpsc::UnboundedReceiver<Notification>,
    }

    async fn harness(edition: Edition) -> Harness {
        let repos: Arc<dyn RepositoryProvider> = fixtures::repositories().await;
        fixtures::seed_standalone_project(repos.as_ref()).await;

        let (tx, rx) = mpsc::unbounded_channel();
        let plans = Arc::new(PlanService::new(
            repos.clone(),
            Arc::new(MemoryLockService::new()),
            edition,
            StdDuration::from_secs(5),
        ));
        let alerts = Arc::new(UsageAlerts::new(Arc::new(RecordingNotifier(tx))));

        Harness {
            usage: Arc::new(UsageService::new(repos.clone(), plans, alerts)),
            repos,
            sent: rx,
        }
    }

    async fn set_tasks_cap(h: &Harness, tasks: i64) {
        h.usage
            .plans()
            .update_plan(
                "p1",
                PlanLimits {
                    name: "test".into(),
                    tasks,
                    tasks_per_day: None,
                    team_members: 10,
                    connections: 10,
                },
            )
            .await
            .unwrap();
    }

    async fn next_template(h: &mut Harness) -> Option<String> {
        tokio::time::timeout(StdDuration::from_millis(200), h.sent.recv())
            .await
            .ok()
            .flatten()
            .map(|n| n.template)
    }

    #[tokio::test]
    async fn usage_read_is_idempotent_within_a_window() {
        let h = harness(Edition::Cloud).await;

        let first = h.usage.get_usage_by_project_id("p1").await.unwrap();
        let second = h.usage.get_usage_by_project_id("p1").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.consumed_tasks, 0);
        assert_eq!(first.team_members, 1);
        assert_eq!(first.connections, 0);
        assert!(first.next_reset_datetime > Utc::now());
    }

    #[tokio::test]
    async fn concurrent_consumption_is_not_lost() {
        let h = harness(Edition::Enterprise).await;
        h.usage.get_usage_by_project_id("p1").await.unwrap();

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let usage = h.usage.clone();
                tokio::spawn(async move { usage.add_tasks_consumed("p1", 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let summary = h.usage.get_usage_by_project_id("p1").await.unwrap();
        assert_eq!(summary.consumed_tasks, 25);
        assert_eq!(summary.tasks_today, 25);
    }

    #[tokio::test]
    async fn burst_fires_each_crossed_threshold_once() {
        let mut h = harness(Edition::Cloud).await;
        set_tasks_cap(&h, 1000).await;

        h.usage.add_tasks_consumed("p1", 450).await.unwrap();
        assert_eq!(next_template(&mut h).await, None);

        h.usage.add_tasks_consumed("p1", 500).await.unwrap();
        let mut fired = vec![
            next_template(&mut h).await.unwrap(),
            next_template(&mut h).await.unwrap(),
        ];
        fired.sort();
        assert_eq!(fired, ["quota-50", "quota-90"]);

        h.usage.add_tasks_consumed("p1", 10).await.unwrap();
        assert_eq!(next_template(&mut h).await, None);
    }

    #[tokio::test]
    async fn threshold_already_passed_is_not_repeated() {
        let mut h = harness(Edition::Cloud).await;
        set_tasks_cap(&h, 1000).await;

        h.usage.add_tasks_consumed("p1", 500).await.unwrap();
        assert_eq!(next_template(&mut h).await.as_deref(), Some("quota-50"));

        h.usage.add_tasks_consumed("p1", 450).await.unwrap();
        assert_eq!(next_template(&mut h).await.as_deref(), Some("quota-90"));
        assert_eq!(next_template(&mut h).await, None);

        let summary = h.usage.get_usage_by_project_id("p1").await.unwrap();
        assert_eq!(summary.consumed_tasks, 950);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_steps_fire_a_crossing_exactly_once() {
        for _ in 0..5 {
            let mut h = harness(Edition::Cloud).await;
            set_tasks_cap(&h, 100).await;
            h.usage.add_tasks_consumed("p1", 45).await.unwrap();

            let handles: Vec<_> = (0..10)
                .map(|_| {
                    let usage = h.usage.clone();
                    tokio::spawn(async move { usage.add_tasks_consumed("p1", 1).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert_eq!(next_template(&mut h).await.as_deref(), Some("quota-50"));
            assert_eq!(next_template(&mut h).await, None);
            assert_eq!(h.usage.get_usage_by_project_id("p1").await.unwrap().consumed_tasks, 55);
        }
    }

    #[tokio::test]
    async fn daily_capped_plan_from_400_to_950_sends_only_the_90_percent_alert() {
        let mut h = harness(Edition::Cloud).await;
        // Default cloud plan: 1000 tasks per window, capped daily.
        let plan = h.usage.plans().get_or_create_default_plan("p1").await.unwrap();
        assert_eq!(plan.tasks, 1000);
        assert!(plan.tasks_per_day.is_some());

        h.usage.add_tasks_consumed("p1", 400).await.unwrap();
        assert_eq!(next_template(&mut h).await, None);

        h.usage.add_tasks_consumed("p1", 550).await.unwrap();
        assert_eq!(next_template(&mut h).await.as_deref(), Some("quota-90"));
        assert_eq!(next_template(&mut h).await, None);

        assert_eq!(h.usage.get_usage_by_project_id("p1").await.unwrap().consumed_tasks, 950);
    }

    #[tokio::test]
    async fn window_rolls_over_after_thirty_days() {
        let h = harness(Edition::Cloud).await;
        let plan = h.usage.plans().get_or_create_default_plan("p1").await.unwrap();
        let start = plan.subscription_start_datetime;

        let first = h.usage.current_usage(&plan, start + Duration::days(1)).await.unwrap();
        h.repos.usages().increment_consumed(&first.id, 40).await.unwrap();

        let later = h.usage.current_usage(&plan, start + Duration::days(31)).await.unwrap();
        assert_ne!(later.id, first.id);
        assert_eq!(later.consumed_tasks, 0);
        assert_eq!(
            later.next_reset_datetime.timestamp_millis(),
            (start + Duration::days(60)).timestamp_millis()
        );

        // The old window stays as history.
        let old = h
            .repos
            .usages()
            .find_window("p1", first.next_reset_datetime)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.consumed_tasks, 40);
    }

    #[tokio::test]
    async fn non_positive_consumption_is_ignored() {
        let h = harness(Edition::Cloud).await;
        h.usage.add_tasks_consumed("p1", 0).await.unwrap();
        h.usage.add_tasks_consumed("p1", -3).await.unwrap();
        assert_eq!(h.usage.get_usage_by_project_id("p1").await.unwrap().consumed_tasks, 0);
    }

    #[tokio::test]
    async fn summary_counts_members_and_connections() {
        let h = harness(Edition::Enterprise).await;
        h.repos
            .project_members()
            .upsert(fixtures::member("p1", "m1", crate::domain::ProjectMemberRole::Editor))
            .await
            .unwrap();
        h.repos
            .app_connections()
            .create(crate::domain::AppConnection {
                id: "c1".into(),
                project_id: "p1".into(),
                display_name: "slack".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let summary = h.usage.get_usage_by_project_id("p1").await.unwrap();
        assert_eq!(summary.team_members, 2);
        assert_eq!(summary.connections, 1);
    }
}
