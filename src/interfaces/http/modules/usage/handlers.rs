//! Usage handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::info;

use super::dto::{RecordTasksRequest, UsageDto};
use crate::application::{QuotaGate, UsageService};
use crate::domain::Principal;
use crate::interfaces::http::common::{ApiResponse, ErrorResponse, ValidatedJson};
use crate::shared::ControlPlaneError;

#[derive(Clone)]
pub struct UsageState {
    pub usage: Arc<UsageService>,
    pub quota: Arc<QuotaGate>,
}

async fn usage_of(state: &UsageState, project_id: &str) -> Result<UsageDto, ControlPlaneError> {
    let plan = state.usage.plans().get_or_create_default_plan(project_id).await?;
    let summary = state.usage.get_usage_by_project_id(project_id).await?;
    Ok(UsageDto::new(summary, plan))
}

#[utoipa::path(
    get,
    path = "/v1/usage",
    tag = "Usage",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Usage of the caller's project", body = ApiResponse<UsageDto>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
pub async fn get_usage(
    State(state): State<UsageState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<UsageDto>>, ControlPlaneError> {
    let usage = usage_of(&state, &principal.project_id).await?;
    Ok(Json(ApiResponse::success(usage)))
}

#[utoipa::path(
    post,
    path = "/v1/usage/tasks",
    tag = "Usage",
    security(("bearer_auth" = [])),
    request_body = RecordTasksRequest,
    responses(
        (status = 200, description = "Tasks recorded", body = ApiResponse<UsageDto>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 402, description = "Task quota exhausted", body = ErrorResponse),
        (status = 422, description = "Validation error")
    )
)]
pub async fn record_tasks(
    State(state): State<UsageState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(body): ValidatedJson<RecordTasksRequest>,
) -> Result<Json<ApiResponse<UsageDto>>, ControlPlaneError> {
    let project_id = principal.project_id.as_str();

    state.quota.limit(project_id).await?;
    state.usage.add_tasks_consumed(project_id, body.tasks).await?;
    info!(%project_id, tasks = body.tasks, "Tasks recorded");

    let usage = usage_of(&state, project_id).await?;
    Ok(Json(ApiResponse::success(usage)))
}
