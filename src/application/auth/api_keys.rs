//! Platform API key issuance

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::{ApiKey, ControlPlaneError, DomainResult, RepositoryProvider};
use crate::infrastructure::crypto::api_key::generate_api_key;

/// A freshly issued key. `key` is the only time the secret is visible.
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub api_key: ApiKey,
    pub key: String,
}

pub struct ApiKeyService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ApiKeyService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn create(&self, platform_id: &str, display_name: &str) -> DomainResult<IssuedApiKey> {
        if self.repos.platforms().find_by_id(platform_id).await?.is_none() {
            return Err(ControlPlaneError::not_found("Platform", platform_id));
        }

        let generated = generate_api_key();
        let api_key = ApiKey {
            id: uuid::Uuid::new_v4().to_string(),
            platform_id: platform_id.to_string(),
            display_name: display_name.to_string(),
            key_hash: generated.key_hash,
            truncated_value: generated.truncated,
            created_at: Utc::now(),
            last_used_at: None,
        };
        self.repos.api_keys().create(api_key.clone()).await?;

        info!(platform_id, key_id = %api_key.id, "API key created");
        Ok(IssuedApiKey {
            api_key,
            key: generated.key,
        })
    }
}
