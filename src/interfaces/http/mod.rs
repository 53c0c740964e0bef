//! HTTP REST API interfaces
//!
//! - `common`: response envelope, error mapping, validated JSON extractor
//! - `middleware`: principal/platform resolution and the RBAC gate
//! - `modules`: request handlers grouped by resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use common::{ApiResponse, ValidatedJson};
pub use middleware::{AuthState, ResolvedPlatform};
pub use router::{create_api_router, AppState};
