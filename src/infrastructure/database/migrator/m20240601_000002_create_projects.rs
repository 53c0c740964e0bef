//! Create projects table

use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_platforms::Platforms;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::OwnerId).string().not_null())
                    .col(ColumnDef::new(Projects::DisplayName).string_len(255).not_null())
                    .col(ColumnDef::new(Projects::PlatformId).string().null())
                    .col(
                        ColumnDef::new(Projects::ProjectType)
                            .string_len(32)
                            .not_null()
                            .default("STANDALONE"),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_platform_id")
                            .from(Projects::Table, Projects::PlatformId)
                            .to(Platforms::Table, Platforms::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_platform_id")
                    .table(Projects::Table)
                    .col(Projects::PlatformId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Projects {
    Table,
    Id,
    OwnerId,
    DisplayName,
    PlatformId,
    ProjectType,
    CreatedAt,
}
