//! SeaORM implementation of ProjectMemberRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::domain::{
    ControlPlaneError, DomainResult, MemberStatus, ProjectMember, ProjectMemberRepository,
    ProjectMemberRole,
};
use crate::infrastructure::database::entities::project_member;

fn role_to_domain(r: project_member::MemberRole) -> ProjectMemberRole {
    match r {
        project_member::MemberRole::Admin => ProjectMemberRole::Admin,
        project_member::MemberRole::Editor => ProjectMemberRole::Editor,
        project_member::MemberRole::Operator => ProjectMemberRole::Operator,
        project_member::MemberRole::Viewer => ProjectMemberRole::Viewer,
    }
}

fn role_to_entity(r: ProjectMemberRole) -> project_member::MemberRole {
    match r {
        ProjectMemberRole::Admin => project_member::MemberRole::Admin,
        ProjectMemberRole::Editor => project_member::MemberRole::Editor,
        ProjectMemberRole::Operator => project_member::MemberRole::Operator,
        ProjectMemberRole::Viewer => project_member::MemberRole::Viewer,
    }
}

fn status_to_entity(s: MemberStatus) -> project_member::MemberStatus {
    match s {
        MemberStatus::Pending => project_member::MemberStatus::Pending,
        MemberStatus::Active => project_member::MemberStatus::Active,
    }
}

fn model_to_domain(m: project_member::Model) -> ProjectMember {
    ProjectMember {
        id: m.id,
        project_id: m.project_id,
        user_id: m.user_id,
        email: m.email,
        role: role_to_domain(m.role),
        status: match m.status {
            project_member::MemberStatus::Pending => MemberStatus::Pending,
            project_member::MemberStatus::Active => MemberStatus::Active,
        },
        created_at: m.created_at,
    }
}

pub struct SeaOrmProjectMemberRepository {
    db: DatabaseConnection,
}

impl SeaOrmProjectMemberRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectMemberRepository for SeaOrmProjectMemberRepository {
    async fn upsert(&self, m: ProjectMember) -> DomainResult<ProjectMember> {
        let project_id = m.project_id.clone();
        let email = m.email.clone();

        let model = project_member::ActiveModel {
            id: Set(m.id),
            project_id: Set(m.project_id),
            user_id: Set(m.user_id),
            email: Set(m.email),
            role: Set(role_to_entity(m.role)),
            status: Set(status_to_entity(m.status)),
            created_at: Set(m.created_at),
        };

        project_member::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    project_member::Column::ProjectId,
                    project_member::Column::Email,
                ])
                .update_columns([
                    project_member::Column::UserId,
                    project_member::Column::Role,
                    project_member::Column::Status,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        project_member::Entity::find()
            .filter(project_member::Column::ProjectId.eq(&project_id))
            .filter(project_member::Column::Email.eq(&email))
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .ok_or_else(|| ControlPlaneError::not_found("ProjectMember", email))
    }

    async fn find_by_user(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> DomainResult<Option<ProjectMember>> {
        let model = project_member::Entity::find()
            .filter(project_member::Column::ProjectId.eq(project_id))
            .filter(project_member::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn count_active(&self, project_id: &str) -> DomainResult<i64> {
        let count = project_member::Entity::find()
            .filter(project_member::Column::ProjectId.eq(project_id))
            .filter(project_member::Column::Status.eq(project_member::MemberStatus::Active))
            .count(&self.db)
            .await?;
        Ok(count as i64)
    }
}
