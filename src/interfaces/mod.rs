//! Interface adapters
//!
//! - `http`: axum middleware (request id, principal resolution, RBAC) and
//!   the REST surface with Swagger documentation

pub mod http;
