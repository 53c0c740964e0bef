//! Plans and usage counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edition::Edition;
use super::tenancy::ProjectType;

/// The quota ceiling of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub id: String,
    pub project_id: String,
    pub name: String,
    /// Tasks per rolling window.
    pub tasks: i64,
    pub tasks_per_day: Option<i64>,
    pub team_members: i64,
    pub connections: i64,
    pub subscription_start_datetime: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Limits a plan is created or updated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub name: String,
    pub tasks: i64,
    pub tasks_per_day: Option<i64>,
    pub team_members: i64,
    pub connections: i64,
}

impl PlanLimits {
    /// Default plan for a freshly seen project.
    pub fn default_for(edition: Edition, project_type: ProjectType) -> Self {
        match (edition, project_type) {
            (_, ProjectType::PlatformManaged) => Self {
                name: "platform".into(),
                tasks: 50_000,
                tasks_per_day: None,
                team_members: 100,
                connections: 1_000,
            },
            (Edition::Cloud, ProjectType::Standalone) => Self {
                name: "free".into(),
                tasks: 1_000,
                tasks_per_day: Some(100),
                team_members: 1,
                connections: 25,
            },
            (_, ProjectType::Standalone) => Self {
                name: "self-hosted".into(),
                tasks: 1_000_000_000,
                tasks_per_day: None,
                team_members: 1_000,
                connections: 1_000_000,
            },
        }
    }
}

/// Rolling-window consumption counter. Old windows stay as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUsage {
    pub id: String,
    pub project_id: String,
    pub consumed_tasks: i64,
    pub next_reset_datetime: DateTime<Utc>,
}

/// Usage of the current window plus live-computed counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub id: String,
    pub project_id: String,
    pub consumed_tasks: i64,
    pub next_reset_datetime: DateTime<Utc>,
    /// Owner plus active members.
    pub team_members: i64,
    pub connections: i64,
    pub tasks_today: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cloud_standalone_projects_get_a_daily_cap() {
        let free = PlanLimits::default_for(Edition::Cloud, ProjectType::Standalone);
        assert_eq!(free.tasks_per_day, Some(100));
        assert_eq!(free.tasks, 1_000);

        let managed = PlanLimits::default_for(Edition::Cloud, ProjectType::PlatformManaged);
        assert!(managed.tasks_per_day.is_none());

        let ce = PlanLimits::default_for(Edition::Community, ProjectType::Standalone);
        assert!(ce.tasks_per_day.is_none());
        assert_eq!(ce.name, "self-hosted");
    }
}
