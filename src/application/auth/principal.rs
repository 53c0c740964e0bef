//! Principal resolver
//!
//! Turns a request's credentials into a `Principal`:
//! - operator routes check the global key and skip principal resolution
//! - no credential gives an anonymous principal
//! - `sk-` credentials are platform API keys scoped by the project header
//! - anything else is a bearer token; a bad one degrades to anonymous
//!
//! Anonymous principals are then rejected on every non-public route.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::routes::RoutePolicy;
use super::token::TokenService;
use crate::domain::{ControlPlaneError, DomainResult, Principal, RepositoryProvider};
use crate::infrastructure::crypto::api_key::{hash_api_key, is_api_key_format};

/// Credentials pulled off an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    pub path: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Global operator key header.
    pub operator_key: Option<String>,
    /// Tenant-scoping project header, required with API keys.
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCaller {
    /// Caller presented the global operator key on an operator route.
    Operator,
    Principal(Principal),
}

pub struct PrincipalResolver {
    repos: Arc<dyn RepositoryProvider>,
    tokens: Arc<TokenService>,
    routes: RoutePolicy,
    operator_key: Option<String>,
}

impl PrincipalResolver {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        tokens: Arc<TokenService>,
        routes: RoutePolicy,
        operator_key: Option<String>,
    ) -> Self {
        Self {
            repos,
            tokens,
            routes,
            operator_key: operator_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn routes(&self) -> &RoutePolicy {
        &self.routes
    }

    pub async fn resolve(&self, request: &RequestCredentials) -> DomainResult<ResolvedCaller> {
        if self.routes.is_operator_route(&request.path) {
            return self.check_operator_key(request.operator_key.as_deref());
        }

        let principal = match request.authorization.as_deref().map(strip_bearer) {
            None | Some("") => Principal::anonymous(),
            Some(credential) if is_api_key_format(credential) => {
                self.resolve_api_key(credential, request.project_id.as_deref())
                    .await?
            }
            Some(token) => self.resolve_token(token).await,
        };

        if principal.is_anonymous() && !self.routes.is_exempt(&request.path) {
            debug!(path = %request.path, "Anonymous request to protected route");
            return Err(ControlPlaneError::InvalidBearerToken);
        }

        Ok(ResolvedCaller::Principal(principal))
    }

    fn check_operator_key(&self, presented: Option<&str>) -> DomainResult<ResolvedCaller> {
        match (self.operator_key.as_deref(), presented) {
            (Some(expected), Some(presented)) if constant_time_eq(expected, presented) => {
                Ok(ResolvedCaller::Operator)
            }
            _ => Err(ControlPlaneError::InvalidApiKey),
        }
    }

    async fn resolve_api_key(
        &self,
        credential: &str,
        project_id: Option<&str>,
    ) -> DomainResult<Principal> {
        let key = self
            .repos
            .api_keys()
            .find_by_hash(&hash_api_key(credential))
            .await?
            .ok_or(ControlPlaneError::InvalidApiKey)?;

        let project_id = project_id
            .filter(|id| !id.is_empty())
            .ok_or(ControlPlaneError::InvalidBearerToken)?;

        // A missing project and another platform's project look the same
        // to the caller.
        let project = self
            .repos
            .projects()
            .find_by_id(project_id)
            .await?
            .filter(|project| project.platform_id.as_deref() == Some(key.platform_id.as_str()));

        let Some(project) = project else {
            warn!(
                key_id = %key.id,
                %project_id,
                "API key used against a project outside its platform"
            );
            return Err(ControlPlaneError::InvalidBearerToken);
        };

        // Fire-and-forget: update last_used_at in background
        let repos = self.repos.clone();
        let key_id = key.id.clone();
        tokio::spawn(async move {
            if let Err(e) = repos.api_keys().touch_last_used(&key_id, Utc::now()).await {
                debug!(%key_id, error = %e, "Failed to update API key last_used_at");
            }
        });

        Ok(Principal::service(
            key.id,
            project.id,
            project.project_type,
            key.platform_id,
        ))
    }

    async fn resolve_token(&self, token: &str) -> Principal {
        match self.tokens.decode_and_verify::<Principal>(token).await {
            Ok(principal) => principal,
            Err(e) => {
                warn!(error = %e, "Ignoring unverifiable bearer token");
                metrics::counter!("auth_invalid_tokens_total").increment(1);
                Principal::anonymous()
            }
        }
    }
}

fn strip_bearer(header: &str) -> &str {
    let header = header.trim();
    match header.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => header[7..].trim(),
        _ => header,
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::{ApiKey, DeploymentMode, PrincipalType, ProjectType};
    use crate::infrastructure::crypto::api_key::generate_api_key;
    use crate::infrastructure::database::fixtures;
    use crate::infrastructure::SecretProvider;

    struct Harness {
        resolver: PrincipalResolver,
        tokens: Arc<TokenService>,
        api_key: String,
    }

    async fn harness() -> Harness {
        let repos = fixtures::repositories().await;
        fixtures::seed_managed_project(repos.as_ref()).await;
        repos
            .platforms()
            .create(fixtures::platform("plat-2", "other-owner", Utc::now()))
            .await
            .unwrap();
        repos
            .projects()
            .create(fixtures::project("p2", "owner-2", Some("plat-2")))
            .await
            .unwrap();

        let generated = generate_api_key();
        repos
            .api_keys()
            .create(ApiKey {
                id: "key-1".into(),
                platform_id: "plat-1".into(),
                display_name: "ci".into(),
                key_hash: generated.key_hash.clone(),
                truncated_value: generated.truncated.clone(),
                created_at: Utc::now(),
                last_used_at: None,
            })
            .await
            .unwrap();

        let secrets = SecretProvider::new(
            Some("test-secret".into()),
            DeploymentMode::MultiNode,
            std::env::temp_dir().join("unused-secret"),
        );
        let tokens = Arc::new(TokenService::new(
            Arc::new(secrets),
            "control-plane",
            Duration::days(7),
        ));

        Harness {
            resolver: PrincipalResolver::new(
                repos,
                tokens.clone(),
                RoutePolicy::default(),
                Some("operator-key".into()),
            ),
            tokens,
            api_key: generated.key,
        }
    }

    fn request(path: &str, authorization: Option<String>) -> RequestCredentials {
        RequestCredentials {
            path: path.into(),
            authorization,
            ..Default::default()
        }
    }

    fn principal(caller: ResolvedCaller) -> Principal {
        match caller {
            ResolvedCaller::Principal(p) => p,
            ResolvedCaller::Operator => panic!("unexpected operator"),
        }
    }

    #[tokio::test]
    async fn missing_credential_is_anonymous_on_public_routes() {
        let h = harness().await;
        let caller = h.resolver.resolve(&request("/v1/health", None)).await.unwrap();
        assert!(principal(caller).is_anonymous());
    }

    #[tokio::test]
    async fn missing_credential_is_rejected_on_protected_routes() {
        let h = harness().await;
        let err = h.resolver.resolve(&request("/v1/flows", None)).await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::InvalidBearerToken));
    }

    #[tokio::test]
    async fn valid_bearer_token_resolves_its_principal() {
        let h = harness().await;
        let user = Principal::user("u1", "p1", ProjectType::Standalone, None);
        let token = h.tokens.sign(&user).await.unwrap();

        let caller = h
            .resolver
            .resolve(&request("/v1/flows", Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(principal(caller), user);
    }

    #[tokio::test]
    async fn bad_token_degrades_to_anonymous() {
        let h = harness().await;

        let public = h
            .resolver
            .resolve(&request("/v1/health", Some("Bearer garbage".into())))
            .await
            .unwrap();
        assert!(principal(public).is_anonymous());

        let protected = h
            .resolver
            .resolve(&request("/v1/flows", Some("Bearer garbage".into())))
            .await
            .unwrap_err();
        assert!(matches!(protected, ControlPlaneError::InvalidBearerToken));
    }

    #[tokio::test]
    async fn api_key_resolves_a_service_principal() {
        let h = harness().await;
        let mut req = request("/v1/flows", Some(format!("Bearer {}", h.api_key)));
        req.project_id = Some("p1".into());

        let p = principal(h.resolver.resolve(&req).await.unwrap());
        assert_eq!(p.kind, PrincipalType::Service);
        assert_eq!(p.id, "key-1");
        assert_eq!(p.project_id, "p1");
        assert_eq!(p.platform_id(), Some("plat-1"));
    }

    #[tokio::test]
    async fn api_key_of_another_platform_is_rejected() {
        let h = harness().await;
        let mut req = request("/v1/flows", Some(format!("Bearer {}", h.api_key)));
        req.project_id = Some("p2".into());

        let err = h.resolver.resolve(&req).await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::InvalidBearerToken));
    }

    #[tokio::test]
    async fn foreign_and_missing_projects_are_indistinguishable() {
        let h = harness().await;

        let mut foreign = request("/v1/flows", Some(format!("Bearer {}", h.api_key)));
        foreign.project_id = Some("p2".into());
        let mut missing = request("/v1/flows", Some(format!("Bearer {}", h.api_key)));
        missing.project_id = Some("does-not-exist".into());

        let foreign_err = h.resolver.resolve(&foreign).await.unwrap_err();
        let missing_err = h.resolver.resolve(&missing).await.unwrap_err();

        assert!(matches!(missing_err, ControlPlaneError::InvalidBearerToken));
        assert_eq!(foreign_err.code(), missing_err.code());
        assert_eq!(foreign_err.to_string(), missing_err.to_string());
    }

    #[tokio::test]
    async fn api_key_needs_the_project_header() {
        let h = harness().await;
        let req = request("/v1/flows", Some(format!("Bearer {}", h.api_key)));
        assert!(matches!(
            h.resolver.resolve(&req).await,
            Err(ControlPlaneError::InvalidBearerToken)
        ));
    }

    #[tokio::test]
    async fn unknown_api_key_is_rejected_even_on_public_routes() {
        let h = harness().await;
        let req = request("/v1/health", Some(format!("Bearer {}", generate_api_key().key)));
        assert!(matches!(
            h.resolver.resolve(&req).await,
            Err(ControlPlaneError::InvalidApiKey)
        ));
    }

    #[tokio::test]
    async fn operator_routes_need_the_global_key() {
        let h = harness().await;

        let mut req = request("/v1/admin/metrics", None);
        assert!(matches!(
            h.resolver.resolve(&req).await,
            Err(ControlPlaneError::InvalidApiKey)
        ));

        req.operator_key = Some("wrong".into());
        assert!(matches!(
            h.resolver.resolve(&req).await,
            Err(ControlPlaneError::InvalidApiKey)
        ));

        req.operator_key = Some("operator-key".into());
        assert_eq!(h.resolver.resolve(&req).await.unwrap(), ResolvedCaller::Operator);
    }

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("bearer abc"), "abc");
        assert_eq!(strip_bearer("sk-123"), "sk-123");
    }
}
