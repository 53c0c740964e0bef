//! Usage threshold alerts
//!
//! An alert fires when a single consumption step moves the task usage from
//! below a threshold to at-or-above it. Failures are logged and counted,
//! never surfaced to the caller.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::domain::{Notification, Notifier, ProjectPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThreshold {
    pub percent: i64,
    pub template: &'static str,
    /// Whether the alert is also sent for plans with a daily cap.
    pub applies_to_daily_capped: bool,
}

pub const THRESHOLDS: &[AlertThreshold] = &[
    AlertThreshold {
        percent: 50,
        template: "quota-50",
        applies_to_daily_capped: false,
    },
    AlertThreshold {
        percent: 90,
        template: "quota-90",
        applies_to_daily_capped: true,
    },
    AlertThreshold {
        percent: 100,
        template: "quota-100",
        applies_to_daily_capped: true,
    },
];

/// `floor(consumed / cap * 100)`; zero for a non-positive cap.
pub fn usage_percent(consumed: i64, cap: i64) -> i64 {
    if cap <= 0 {
        return 0;
    }
    let percent = (consumed.max(0) as i128 * 100) / cap as i128;
    percent.min(i64::MAX as i128) as i64
}

/// Thresholds crossed moving from `old` to `new` consumed tasks.
pub fn crossed_thresholds(old: i64, new: i64, cap: i64, daily_capped: bool) -> Vec<AlertThreshold> {
    let before = usage_percent(old, cap);
    let after = usage_percent(new, cap);

    THRESHOLDS
        .iter()
        .filter(|t| before < t.percent && t.percent <= after)
        .filter(|t| !daily_capped || t.applies_to_daily_capped)
        .copied()
        .collect()
}

pub struct UsageAlerts {
    notifier: Arc<dyn Notifier>,
}

impl UsageAlerts {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Send one notification per crossed threshold. Returns how many were
    /// sent successfully.
    pub async fn check(&self, plan: &ProjectPlan, old: i64, new: i64) -> usize {
        let crossed = crossed_thresholds(old, new, plan.tasks, plan.tasks_per_day.is_some());
        let mut sent = 0;

        for threshold in crossed {
            let notification = Notification {
                template: threshold.template.to_string(),
                project_id: plan.project_id.clone(),
                data: json!({
                    "percent": threshold.percent,
                    "consumedTasks": new,
                    "tasksQuota": plan.tasks,
                    "plan": plan.name,
                }),
            };

            match self.notifier.send(notification).await {
                Ok(()) => {
                    sent += 1;
                    metrics::counter!("usage_alerts_sent_total", "template" => threshold.template)
                        .increment(1);
                    info!(project_id = %plan.project_id, template = threshold.template, "Usage alert sent");
                }
                Err(e) => {
                    metrics::counter!("usage_alert_failures_total").increment(1);
                    warn!(
                        project_id = %plan.project_id,
                        template = threshold.template,
                        error = %e,
                        "Failed to send usage alert"
                    );
                }
            }
        }

        sent
    }
}
