//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_platforms;
mod m20240601_000002_create_projects;
mod m20240601_000003_create_project_members;
mod m20240601_000004_create_api_keys;
mod m20240601_000005_create_custom_domains;
mod m20240601_000006_create_project_plans;
mod m20240601_000007_create_project_usages;
mod m20240601_000008_create_app_connections;
mod m20240601_000009_create_task_runs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_platforms::Migration),
            Box::new(m20240601_000002_create_projects::Migration),
            Box::new(m20240601_000003_create_project_members::Migration),
            Box::new(m20240601_000004_create_api_keys::Migration),
            Box::new(m20240601_000005_create_custom_domains::Migration),
            Box::new(m20240601_000006_create_project_plans::Migration),
            Box::new(m20240601_000007_create_project_usages::Migration),
            Box::new(m20240601_000008_create_app_connections::Migration),
            Box::new(m20240601_000009_create_task_runs::Migration),
        ]
    }
}
