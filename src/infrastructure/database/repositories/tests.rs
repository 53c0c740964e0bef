use std::sync::Arc;

use chrono::{Duration, DurationRound, TimeZone, Utc};

use crate::domain::{
    ApiKey, CustomDomain, PlanLimits, ProjectMemberRole, ProjectPlan, ProjectUsage,
    RepositoryProvider, Edition, ProjectType, MemberStatus,
};
use crate::infrastructure::database::fixtures;

fn plan_for(project_id: &str, limits: PlanLimits) -> ProjectPlan {
    let now = Utc::now();
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

#[tokio::test]
async fn oldest_platform_is_the_first_created() {
    let repos = fixtures::repositories().await;
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    repos
        .platforms()
        .create(fixtures::platform("newer", "u", t0 + Duration::days(3)))
        .await
        .unwrap();
    repos
        .platforms()
        .create(fixtures::platform("older", "u", t0))
        .await
        .unwrap();

    let oldest = repos.platforms().find_oldest().await.unwrap().unwrap();
    assert_eq!(oldest.id, "older");
}

#[tokio::test]
async fn custom_domain_lookup_ignores_case() {
    let repos = fixtures::repositories().await;
    fixtures::seed_managed_project(repos.as_ref()).await;

    repos
        .custom_domains()
        .create(CustomDomain {
            id: "d1".into(),
            domain: "Flows.Example.com".into(),
            platform_id: "plat-1".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let found = repos
        .custom_domains()
        .find_by_domain("flows.example.COM")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.platform_id, "plat-1");
    assert!(repos
        .custom_domains()
        .find_by_domain("other.example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn member_upsert_keeps_one_row_per_email() {
    let repos = fixtures::repositories().await;
    fixtures::seed_standalone_project(repos.as_ref()).await;

    let mut invited = fixtures::member("p1", "alice", ProjectMemberRole::Viewer);
    invited.user_id = None;
    invited.status = MemberStatus::Pending;
    repos.project_members().upsert(invited).await.unwrap();
    assert_eq!(repos.project_members().count_active("p1").await.unwrap(), 0);

    let accepted = fixtures::member("p1", "alice", ProjectMemberRole::Editor);
    let stored = repos.project_members().upsert(accepted).await.unwrap();
    assert_eq!(stored.role, ProjectMemberRole::Editor);
    assert_eq!(stored.status, MemberStatus::Active);

    assert_eq!(repos.project_members().count_active("p1").await.unwrap(), 1);
    let by_user = repos
        .project_members()
        .find_by_user("p1", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_user.id, stored.id);
}

#[tokio::test]
async fn api_key_is_found_by_hash_and_touched() {
    let repos = fixtures::repositories().await;
    fixtures::seed_managed_project(repos.as_ref()).await;

    repos
        .api_keys()
        .create(ApiKey {
            id: "k1".into(),
            platform_id: "plat-1".into(),
            display_name: "ci".into(),
            key_hash: "abc".into(),
            truncated_value: "sk-abc...".into(),
            created_at: Utc::now(),
            last_used_at: None,
        })
        .await
        .unwrap();

    let at = Utc::now().duration_trunc(Duration::seconds(1)).unwrap();
    repos.api_keys().touch_last_used("k1", at).await.unwrap();

    let key = repos.api_keys().find_by_hash("abc").await.unwrap().unwrap();
    assert_eq!(key.last_used_at, Some(at));
    assert!(repos.api_keys().find_by_hash("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn plan_upsert_overwrites_limits_in_place() {
    let repos = fixtures::repositories().await;
    fixtures::seed_standalone_project(repos.as_ref()).await;

    let free = plan_for("p1", PlanLimits::default_for(Edition::Cloud, ProjectType::Standalone));
    let original_id = free.id.clone();
    repos.plans().insert_if_absent(free).await.unwrap();

    let mut pro = plan_for("p1", PlanLimits::default_for(Edition::Cloud, ProjectType::Standalone));
    pro.name = "pro".into();
    pro.tasks = 50_000;
    pro.tasks_per_day = None;
    let stored = repos.plans().upsert(pro).await.unwrap();

    assert_eq!(stored.id, original_id);
    assert_eq!(stored.name, "pro");
    assert_eq!(stored.tasks, 50_000);
    assert_eq!(stored.tasks_per_day, None);
}

#[tokio::test]
async fn second_plan_insert_keeps_the_first_row() {
    let repos = fixtures::repositories().await;
    fixtures::seed_standalone_project(repos.as_ref()).await;

    let first = plan_for("p1", PlanLimits::default_for(Edition::Cloud, ProjectType::Standalone));
    let mut second = plan_for("p1", PlanLimits::default_for(Edition::Cloud, ProjectType::Standalone));
    second.name = "other".into();

    let stored_first = repos.plans().insert_if_absent(first.clone()).await.unwrap();
    let stored_second = repos.plans().insert_if_absent(second).await.unwrap();

    assert_eq!(stored_first.id, first.id);
    assert_eq!(stored_second.id, first.id);
    assert_eq!(stored_second.name, "free");
}

#[tokio::test]
async fn usage_window_insert_is_idempotent() {
    let repos = fixtures::repositories().await;
    fixtures::seed_standalone_project(repos.as_ref()).await;
    let reset = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    for id in ["u1", "u2"] {
        repos
            .usages()
            .insert_if_absent(ProjectUsage {
                id: id.into(),
                project_id: "p1".into(),
                consumed_tasks: 0,
                next_reset_datetime: reset,
            })
            .await
            .unwrap();
    }

    let window = repos.usages().find_window("p1", reset).await.unwrap().unwrap();
    assert_eq!(window.id, "u1");
    assert_eq!(repos.usages().find_latest("p1").await.unwrap().unwrap().id, "u1");
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
    let repos = fixtures::repositories().await;
    fixtures::seed_standalone_project(repos.as_ref()).await;
    repos
        .usages()
        .insert_if_absent(ProjectUsage {
            id: "u1".into(),
            project_id: "p1".into(),
            consumed_tasks: 0,
            next_reset_datetime: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repos = Arc::clone(&repos);
            tokio::spawn(async move { repos.usages().increment_consumed("u1", 3).await })
        })
        .collect();
    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap().unwrap());
    }

    // Every caller observes its own increment.
    seen.sort();
    assert_eq!(seen, (1..=20).map(|i| i * 3).collect::<Vec<i64>>());

    let usage = repos.usages().find_latest("p1").await.unwrap().unwrap();
    assert_eq!(usage.consumed_tasks, 60);
}

#[tokio::test]
async fn task_runs_are_summed_from_a_cutoff() {
    let repos = fixtures::repositories().await;
    fixtures::seed_standalone_project(repos.as_ref()).await;
    let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();

    let runs = repos.task_runs();
    runs.record("p1", 7, midnight - Duration::minutes(1)).await.unwrap();
    runs.record("p1", 2, midnight).await.unwrap();
    runs.record("p1", 5, midnight + Duration::hours(3)).await.unwrap();

    assert_eq!(runs.sum_tasks_since("p1", midnight).await.unwrap(), 7);
    assert_eq!(runs.sum_tasks_since("other", midnight).await.unwrap(), 0);
}
