//! SeaORM implementation of ApiKeyRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::{ApiKey, ApiKeyRepository, DomainResult};
use crate::infrastructure::database::entities::api_key;

fn model_to_domain(m: api_key::Model) -> ApiKey {
    ApiKey {
        id: m.id,
        platform_id: m.platform_id,
        display_name: m.display_name,
        key_hash: m.key_hash,
        truncated_value: m.truncated_value,
        created_at: m.created_at,
        last_used_at: m.last_used_at,
    }
}

pub struct SeaOrmApiKeyRepository {
    db: DatabaseConnection,
}

impl SeaOrmApiKeyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApiKeyRepository for SeaOrmApiKeyRepository {
    async fn create(&self, key: ApiKey) -> DomainResult<()> {
        let model = api_key::ActiveModel {
            id: Set(key.id),
            platform_id: Set(key.platform_id),
            display_name: Set(key.display_name),
            key_hash: Set(key.key_hash),
            truncated_value: Set(key.truncated_value),
            created_at: Set(key.created_at),
            last_used_at: Set(key.last_used_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_hash(&self, key_hash: &str) -> DomainResult<Option<ApiKey>> {
        let model = api_key::Entity::find()
            .filter(api_key::Column::KeyHash.eq(key_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn touch_last_used(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        api_key::Entity::update_many()
            .col_expr(api_key::Column::LastUsedAt, Expr::value(Some(at)))
            .filter(api_key::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
