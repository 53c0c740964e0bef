//! Operator-only routes under `/v1/admin`

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
