//! Create project_usages table

use sea_orm_migration::prelude::*;

use super::m20240601_000002_create_projects::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectUsages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectUsages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectUsages::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(ProjectUsages::ConsumedTasks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectUsages::NextResetDatetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_usages_project_id")
                            .from(ProjectUsages::Table, ProjectUsages::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (project, window)
        manager
            .create_index(
                Index::create()
                    .name("idx_project_usages_project_window")
                    .table(ProjectUsages::Table)
                    .col(ProjectUsages::ProjectId)
                    .col(ProjectUsages::NextResetDatetime)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectUsages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ProjectUsages {
    Table,
    Id,
    ProjectId,
    ConsumedTasks,
    NextResetDatetime,
}
