//! Notifications module
//!
//! Usage alerts and plan changes are published on an in-process event bus.
//! The mail/telemetry side subscribes to it; this crate only produces.
//!
//! # Usage
//! ```ignore
//! use control_plane::notifications::{create_event_bus, EventBusNotifier};
//!
//! let bus = create_event_bus();
//! let notifier = EventBusNotifier::new(bus.clone());
//! let mut alerts = bus.subscribe();
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventBusNotifier, EventSubscriber, SharedEventBus};
pub use events::*;
