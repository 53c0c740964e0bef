//! Create project_plans table

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
                    .table(ProjectPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectPlans::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectPlans::ProjectId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProjectPlans::Name).string_len(64).not_null())
                    .col(ColumnDef::new(ProjectPlans::Tasks).big_integer().not_null())
                    .col(ColumnDef::new(ProjectPlans::TasksPerDay).big_integer().null())
                    .col(ColumnDef::new(ProjectPlans::TeamMembers).big_integer().not_null())
                    .col(ColumnDef::new(ProjectPlans::Connections).big_integer().not_null())
                    .col(
                        ColumnDef::new(ProjectPlans::SubscriptionStartDatetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectPlans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_plans_project_id")
                            .from(ProjectPlans::Table, ProjectPlans::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectPlans::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ProjectPlans {
    Table,
    Id,
    ProjectId,
    Name,
    Tasks,
    TasksPerDay,
    TeamMembers,
    Connections,
    SubscriptionStartDatetime,
    UpdatedAt,
}
