//! Role-based access control for project resources.

pub mod permissions;
pub mod service;

pub use permissions::{is_managed_resource, resource_from_path, role_permissions, Permission};
pub use service::RbacService;
