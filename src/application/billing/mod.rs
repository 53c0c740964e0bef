//! Plans, usage windows, threshold alerts and the quota gate.

pub mod alerts;
pub mod plan;
pub mod quota;
pub mod usage;
pub mod window;

pub use alerts::{crossed_thresholds, AlertThreshold, UsageAlerts, THRESHOLDS};
pub use plan::PlanService;
pub use quota::QuotaGate;
pub use usage::UsageService;
pub use window::{next_reset, start_of_day, WINDOW_DAYS};
