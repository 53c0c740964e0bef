//! Event Bus for broadcasting events to subscribers
//!
//! Uses tokio broadcast channel for pub/sub pattern.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::events::{Event, EventMessage, UsageAlertEvent};
use crate::domain::{DomainResult, Notification, Notifier};

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// Event bus for broadcasting events to all subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers. Returns how many received it.
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let project_id = message.event.project_id().to_string();

        match self.sender.send(message) {
            Ok(count) => {
                debug!(event_type, %project_id, subscribers = count, "Event published");
                count
            }
            Err(_) => {
                // Nobody listening, e.g. mail dispatch disabled
                debug!(event_type, %project_id, "Event published (no subscribers)");
                0
            }
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total = count, "New event subscriber");

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    /// Get current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event subscriber that receives events from the bus
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Receive the next event
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return None;
                }
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        debug!(remaining = prev - 1, "Event subscriber dropped");
    }
}

/// Shared event bus type
pub type SharedEventBus = Arc<EventBus>;

/// Create a shared event bus
pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

/// `Notifier` that hands notifications to whoever subscribes to the bus.
pub struct EventBusNotifier {
    bus: SharedEventBus,
}

impl EventBusNotifier {
    pub fn new(bus: SharedEventBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Notifier for EventBusNotifier {
    async fn send(&self, notification: Notification) -> DomainResult<()> {
        self.bus.publish(Event::UsageAlert(UsageAlertEvent {
            project_id: notification.project_id,
            template: notification.template,
            data: notification.data,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::events::PlanChangedEvent;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new();
        let mut subscriber = bus.subscribe();

        let delivered = bus.publish(Event::PlanChanged(PlanChangedEvent {
            project_id: "p1".to_string(),
            plan: "pro".to_string(),
            tasks: 50_000,
            tasks_per_day: None,
        }));
        assert_eq!(delivered, 1);

        let received = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            subscriber.recv(),
        )
        .await
        .expect("Timeout")
        .expect("No message");

        assert_eq!(received.event.event_type(), "plan_changed");
        assert_eq!(received.event.project_id(), "p1");
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(_sub1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn notifier_publishes_usage_alerts() {
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();
        let notifier = EventBusNotifier::new(bus.clone());

        notifier
            .send(Notification {
                template: "quota-90".into(),
                project_id: "p1".into(),
                data: serde_json::json!({ "percent": 90 }),
            })
            .await
            .unwrap();

        match subscriber.recv().await.unwrap().event {
            Event::UsageAlert(alert) => {
                assert_eq!(alert.template, "quota-90");
                assert_eq!(alert.data["percent"], 90);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        let delivered = bus.publish(Event::UsageAlert(UsageAlertEvent {
            project_id: "p1".into(),
            template: "quota-100".into(),
            data: serde_json::Value::Null,
        }));
        assert_eq!(delivered, 0);
    }
}
