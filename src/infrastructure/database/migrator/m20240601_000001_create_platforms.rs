//! Create platforms table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Platforms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Platforms::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Platforms::OwnerId).string().not_null())
                    .col(ColumnDef::new(Platforms::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Platforms::SsoEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Platforms::EmailAuthEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Platforms::AllowedAuthDomains)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Platforms::EnforceAllowedAuthDomains)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Platforms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_platforms_created_at")
                    .table(Platforms::Table)
                    .col(Platforms::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Platforms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Platforms {
    Table,
    Id,
    OwnerId,
    Name,
    SsoEnabled,
    EmailAuthEnabled,
    AllowedAuthDomains,
    EnforceAllowedAuthDomains,
    CreatedAt,
}
