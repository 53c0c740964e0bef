//! Operator DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::auth::IssuedApiKey;
use crate::domain::PlanLimits;

/// Replace a project's plan limits
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(range(min = 0))]
    pub tasks: i64,
    #[validate(range(min = 0))]
    pub tasks_per_day: Option<i64>,
    #[validate(range(min = 1))]
    pub team_members: i64,
    #[validate(range(min = 0))]
    pub connections: i64,
}

impl From<UpdatePlanRequest> for PlanLimits {
    fn from(req: UpdatePlanRequest) -> Self {
        Self {
            name: req.name,
            tasks: req.tasks,
            tasks_per_day: req.tasks_per_day,
            team_members: req.team_members,
            connections: req.connections,
        }
    }
}

/// Issue a platform API key
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

/// Newly issued key. `key` is returned only here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedApiKeyResponse {
    pub id: String,
    pub platform_id: String,
    pub display_name: String,
    pub truncated_value: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

impl From<IssuedApiKey> for CreatedApiKeyResponse {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            id: issued.api_key.id,
            platform_id: issued.api_key.platform_id,
            display_name: issued.api_key.display_name,
            truncated_value: issued.api_key.truncated_value,
            key: issued.key,
            created_at: issued.api_key.created_at,
        }
    }
}
