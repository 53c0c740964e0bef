//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod lock;
pub mod secret;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use lock::MemoryLockService;
pub use secret::{SecretProvider, SigningSecret};
