//! Application layer - use cases over the domain ports

pub mod auth;
pub mod billing;
pub mod rbac;

pub use auth::{
    ApiKeyService, PlatformResolver, PrincipalResolver, RequestCredentials, ResolvedCaller,
    RoutePolicy, TokenService,
};
pub use billing::{PlanService, QuotaGate, UsageAlerts, UsageService};
pub use rbac::RbacService;
