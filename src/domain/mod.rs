pub mod api_key;
pub mod billing;
pub mod edition;
pub mod member;
pub mod ports;
pub mod principal;
pub mod repositories;
pub mod tenancy;

// Re-export commonly used types
pub use api_key::ApiKey;
pub use billing::{PlanLimits, ProjectPlan, ProjectUsage, UsageSummary};
pub use edition::{DeploymentMode, Edition};
pub use member::{MemberStatus, ProjectMember, ProjectMemberRole};
pub use ports::{LockHandle, LockService, Notification, Notifier};
pub use principal::{PlatformContext, PlatformRole, Principal, PrincipalType};
pub use repositories::*;
pub use tenancy::{AppConnection, CustomDomain, Platform, Project, ProjectType};

pub use crate::shared::errors::{ControlPlaneError, DomainResult};
