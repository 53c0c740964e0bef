//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod api_key_repository;
pub mod billing_repository;
pub mod member_repository;
pub mod repository_provider;
pub mod tenancy_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

#[cfg(test)]
mod tests;
