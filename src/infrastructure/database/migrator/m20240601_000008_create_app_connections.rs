//! Create app_connections table

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
                    .table(AppConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppConnections::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppConnections::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(AppConnections::DisplayName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AppConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_app_connections_project_id")
                            .from(AppConnections::Table, AppConnections::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_app_connections_project_id")
                    .table(AppConnections::Table)
                    .col(AppConnections::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppConnections::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum AppConnections {
    Table,
    Id,
    ProjectId,
    DisplayName,
    CreatedAt,
}
