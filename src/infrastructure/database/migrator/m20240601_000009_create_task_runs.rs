//! Create task_runs table

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
                    .table(TaskRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskRuns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskRuns::ProjectId).string().not_null())
                    .col(ColumnDef::new(TaskRuns::Tasks).big_integer().not_null())
                    .col(
                        ColumnDef::new(TaskRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_runs_project_id")
                            .from(TaskRuns::Table, TaskRuns::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Daily sums scan by project and time
        manager
            .create_index(
                Index::create()
                    .name("idx_task_runs_project_created")
                    .table(TaskRuns::Table)
                    .col(TaskRuns::ProjectId)
                    .col(TaskRuns::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskRuns::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum TaskRuns {
    Table,
    Id,
    ProjectId,
    Tasks,
    CreatedAt,
}
