//! Database entities module

pub mod api_key;
pub mod app_connection;
pub mod custom_domain;
pub mod platform;
pub mod project;
pub mod project_member;
pub mod project_plan;
pub mod project_usage;
pub mod task_run;

pub use api_key::Entity as ApiKey;
pub use app_connection::Entity as AppConnection;
pub use custom_domain::Entity as CustomDomain;
pub use platform::Entity as Platform;
pub use project::Entity as Project;
pub use project_member::Entity as ProjectMember;
pub use project_plan::Entity as ProjectPlan;
pub use project_usage::Entity as ProjectUsage;
pub use task_run::Entity as TaskRun;
