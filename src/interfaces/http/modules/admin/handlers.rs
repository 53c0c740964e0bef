//! Operator handlers
//!
//! Reachable only with the global operator key; no principal is resolved.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;

use super::dto::{CreateApiKeyRequest, CreatedApiKeyResponse, UpdatePlanRequest};
use crate::application::{ApiKeyService, PlanService};
use crate::interfaces::http::common::{ApiResponse, ErrorResponse, ValidatedJson};
use crate::interfaces::http::modules::usage::PlanDto;
use crate::notifications::{Event, PlanChangedEvent, SharedEventBus};
use crate::shared::ControlPlaneError;

#[derive(Clone)]
pub struct AdminState {
    pub plans: Arc<PlanService>,
    pub api_keys: Arc<ApiKeyService>,
    pub event_bus: SharedEventBus,
}

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Prometheus text exposition of the process metrics
#[utoipa::path(
    get,
    path = "/v1/admin/metrics",
    tag = "Admin",
    security(("operator_key" = [])),
    responses(
        (status = 200, description = "Prometheus metrics", body = String, content_type = "text/plain"),
        (status = 401, description = "Missing or wrong operator key", body = ErrorResponse)
    )
)]
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

#[utoipa::path(
    post,
    path = "/v1/admin/projects/{project_id}/plan",
    tag = "Admin",
    security(("operator_key" = [])),
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = ApiResponse<PlanDto>),
        (status = 401, description = "Missing or wrong operator key", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_project_plan(
    State(state): State<AdminState>,
    Path(project_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdatePlanRequest>,
) -> Result<Json<ApiResponse<PlanDto>>, ControlPlaneError> {
    let plan = state.plans.update_plan(&project_id, body.into()).await?;

    state.event_bus.publish(Event::PlanChanged(PlanChangedEvent {
        project_id: plan.project_id.clone(),
        plan: plan.name.clone(),
        tasks: plan.tasks,
        tasks_per_day: plan.tasks_per_day,
    }));

    Ok(Json(ApiResponse::success(plan.into())))
}

#[utoipa::path(
    post,
    path = "/v1/admin/platforms/{platform_id}/api-keys",
    tag = "Admin",
    security(("operator_key" = [])),
    params(("platform_id" = String, Path, description = "Platform ID")),
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "Key issued; the secret is shown once", body = ApiResponse<CreatedApiKeyResponse>),
        (status = 401, description = "Missing or wrong operator key", body = ErrorResponse),
        (status = 404, description = "Platform not found", body = ErrorResponse)
    )
)]
pub async fn create_platform_api_key(
    State(state): State<AdminState>,
    Path(platform_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedApiKeyResponse>>), ControlPlaneError> {
    let issued = state.api_keys.create(&platform_id, &body.display_name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(issued.into()))))
}
