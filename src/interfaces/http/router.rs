//! API Router with Swagger UI

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, ErrorResponse};
use super::middleware::{auth_middleware, rbac_middleware, AuthState, OPERATOR_KEY_HEADER};
use super::modules::admin::{self, AdminState, MetricsState};
use super::modules::health::{self, HealthState};
use super::modules::request_id::request_id_middleware;
use super::modules::usage::{self, UsageState};
use super::modules::users;
use crate::application::{
    ApiKeyService, PlanService, PlatformResolver, PrincipalResolver, QuotaGate, RbacService,
    RoutePolicy, TokenService, UsageAlerts, UsageService,
};
use crate::config::{AppConfig, Setting};
use crate::domain::{LockService, RepositoryProvider};
use crate::infrastructure::{SeaOrmRepositoryProvider, SecretProvider};
use crate::notifications::{EventBusNotifier, SharedEventBus};

/// Everything the HTTP layer needs. Handlers pick their slice via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthState,
    pub auth: AuthState,
    pub usage: UsageState,
    pub admin: AdminState,
    pub metrics: MetricsState,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Wire repositories and services from configuration.
    pub fn new(
        db: DatabaseConnection,
        config: &AppConfig,
        secrets: Arc<SecretProvider>,
        locks: Arc<dyn LockService>,
        event_bus: SharedEventBus,
        prometheus: PrometheusHandle,
    ) -> Self {
        let edition = config.edition();
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        let tokens = Arc::new(TokenService::from_config(secrets, config));

        let plans = Arc::new(PlanService::new(
            repos.clone(),
            locks,
            edition,
            Duration::from_secs(config.quota.lock_timeout_secs),
        ));
        let alerts = Arc::new(UsageAlerts::new(Arc::new(EventBusNotifier::new(
            event_bus.clone(),
        ))));
        let usage_service = Arc::new(UsageService::new(repos.clone(), plans.clone(), alerts));
        let quota = Arc::new(QuotaGate::new(
            repos.clone(),
            plans.clone(),
            usage_service.clone(),
            edition,
        ));

        let auth = AuthState {
            principals: Arc::new(PrincipalResolver::new(
                repos.clone(),
                tokens.clone(),
                RoutePolicy::default(),
                config.get(Setting::ApiKey),
            )),
            platforms: Arc::new(PlatformResolver::new(repos.clone(), edition)),
            rbac: Arc::new(RbacService::new(repos.clone(), edition)),
        };

        Self {
            health: HealthState {
                db,
                edition,
                started_at: Arc::new(Instant::now()),
            },
            auth,
            usage: UsageState {
                usage: usage_service,
                quota,
            },
            admin: AdminState {
                plans,
                api_keys: Arc::new(ApiKeyService::new(repos)),
                event_bus,
            },
            metrics: MetricsState { handle: prometheus },
            tokens,
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        s.health.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<AppState> for UsageState {
    fn from_ref(s: &AppState) -> Self {
        s.usage.clone()
    }
}

impl FromRef<AppState> for AdminState {
    fn from_ref(s: &AppState) -> Self {
        s.admin.clone()
    }
}

impl FromRef<AppState> for MetricsState {
    fn from_ref(s: &AppState) -> Self {
        s.metrics.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Signed principal token, or a platform API key (`sk-...`) together with `x-project-id`",
                        ))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "operator_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(OPERATOR_KEY_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::get_current_principal,
        usage::get_usage,
        usage::record_tasks,
        admin::prometheus_metrics,
        admin::update_project_plan,
        admin::create_platform_api_key,
    ),
    components(
        schemas(
            ErrorResponse,
            health::HealthResponse,
            health::ComponentHealth,
            users::CurrentPrincipalDto,
            usage::UsageDto,
            usage::PlanDto,
            usage::RecordTasksRequest,
            admin::UpdatePlanRequest,
            admin::CreateApiKeyRequest,
            admin::CreatedApiKeyResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and database reachability."),
        (name = "Users", description = "The caller as resolved from its credentials."),
        (name = "Usage", description = "Task consumption against the project's plan. Over-quota calls return 402 with `{metric, quota}`."),
        (name = "Admin", description = "Operator routes. Require the global operator key in the `api-key` header."),
    ),
    info(
        title = "Control Plane API",
        version = "0.1.0",
        description = "Tenant attribution, authorization and quota enforcement.

## Authentication

- **Bearer token**: `Authorization: Bearer <token>`
- **Platform API key**: `Authorization: Bearer sk-...` plus `x-project-id: <project>`
- **Operator key**: `api-key: <key>` on `/v1/admin/*`

## Response format

```json
{\"success\": true, \"data\": {...}}
```

On error:
```json
{\"success\": false, \"data\": null, \"error\": \"...\", \"code\": \"QUOTA_EXCEEDED\", \"params\": {\"metric\": \"tasks\", \"quota\": 1000}}
```"
    )
)]
pub struct ApiDoc;

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Route not found")))
}

/// Create the API router with all routes.
///
/// Layer order, outermost first: CORS, trace, request id, principal
/// resolution, RBAC.
pub fn create_api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/health", get(health::health_check))
        .route("/v1/users/me", get(users::get_current_principal))
        .route("/v1/usage", get(usage::get_usage))
        .route("/v1/usage/tasks", post(usage::record_tasks))
        .route("/v1/admin/metrics", get(admin::prometheus_metrics))
        .route(
            "/v1/admin/projects/{project_id}/plan",
            post(admin::update_project_plan),
        )
        .route(
            "/v1/admin/platforms/{platform_id}/api-keys",
            post(admin::create_platform_api_key),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.auth.clone(), rbac_middleware))
        .layer(middleware::from_fn_with_state(state.auth.clone(), auth_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
