//! Current-caller handler

use axum::{extract::State, Extension, Json};

use super::dto::CurrentPrincipalDto;
use crate::domain::Principal;
use crate::interfaces::http::common::{ApiResponse, ErrorResponse};
use crate::interfaces::http::middleware::{AuthState, ResolvedPlatform};
use crate::shared::ControlPlaneError;

#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Resolved caller", body = ApiResponse<CurrentPrincipalDto>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_current_principal(
    State(state): State<AuthState>,
    Extension(principal): Extension<Principal>,
    Extension(ResolvedPlatform(platform_id)): Extension<ResolvedPlatform>,
) -> Result<Json<ApiResponse<CurrentPrincipalDto>>, ControlPlaneError> {
    let role = state.rbac.role_of(&principal).await?;
    Ok(Json(ApiResponse::success(CurrentPrincipalDto::new(
        principal,
        role,
        platform_id,
    ))))
}
