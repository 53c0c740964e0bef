//! # Control Plane
//!
//! Multi-tenant control plane core: request attribution, authentication,
//! project-role authorization and usage quotas.
//!
//! ## Architecture
//!
//! - **domain**: entities, repository traits and collaborator ports
//! - **application**: token/principal/platform resolution, RBAC, plans,
//!   usage windows, threshold alerts and the quota gate
//! - **infrastructure**: SeaORM persistence, signing secret, named locks,
//!   API key crypto
//! - **notifications**: in-process event bus feeding mail/telemetry
//! - **interfaces**: axum middleware and REST surface
//! - **server**: runtime bootstrap shared by the CLI

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, Setting};

pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::http::{create_api_router, AppState};

pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};

pub use shared::{ControlPlaneError, DomainResult};
