//! Create custom_domains table

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
                    .table(CustomDomains::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomDomains::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustomDomains::Domain)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CustomDomains::PlatformId).string().not_null())
                    .col(
                        ColumnDef::new(CustomDomains::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_domains_platform_id")
                            .from(CustomDomains::Table, CustomDomains::PlatformId)
                            .to(Platforms::Table, Platforms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomDomains::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum CustomDomains {
    Table,
    Id,
    Domain,
    PlatformId,
    CreatedAt,
}
