//! Notification events
//!
//! Everything published on the event bus. Subscribers (mail dispatch,
//! telemetry) pick the events they care about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A project's consumption crossed an alert threshold
    UsageAlert(UsageAlertEvent),
    /// An operator changed a project's plan
    PlanChanged(PlanChangedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::UsageAlert(_) => "usage_alert",
            Event::PlanChanged(_) => "plan_changed",
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            Event::UsageAlert(e) => &e.project_id,
            Event::PlanChanged(e) => &e.project_id,
        }
    }
}

/// Rendered by the mail collaborator using `template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageAlertEvent {
    pub project_id: String,
    pub template: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanChangedEvent {
    pub project_id: String,
    pub plan: String,
    pub tasks: i64,
    pub tasks_per_day: Option<i64>,
}

/// Envelope put on the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_type_tag() {
        let msg = EventMessage::new(Event::UsageAlert(UsageAlertEvent {
            project_id: "p1".into(),
            template: "quota-50".into(),
            data: serde_json::json!({ "percent": 50 }),
        }));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "UsageAlert");
        assert_eq!(json["data"]["template"], "quota-50");
        assert!(json["id"].is_string());
    }
}
