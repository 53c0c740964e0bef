//! Authentication and authorization middleware for Axum
//!
//! `auth_middleware` turns the request headers into a caller, attributes the
//! request to a platform and stores both in request extensions.
//! `rbac_middleware` then checks the caller's project role against the
//! resource named by the path.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::application::{
    PlatformResolver, PrincipalResolver, RbacService, RequestCredentials, ResolvedCaller,
};
use crate::domain::Principal;

/// Header carrying the global operator key.
pub const OPERATOR_KEY_HEADER: &str = "api-key";

/// Header scoping an API-key request to one project.
pub const PROJECT_ID_HEADER: &str = "x-project-id";

#[derive(Clone)]
pub struct AuthState {
    pub principals: Arc<PrincipalResolver>,
    pub platforms: Arc<PlatformResolver>,
    pub rbac: Arc<RbacService>,
}

/// Platform the request was attributed to, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPlatform(pub Option<String>);

/// Marker inserted for callers holding the global operator key.
#[derive(Clone, Copy, Debug)]
pub struct OperatorAccess;

fn header_value(request: &Request<Body>, name: impl axum::http::header::AsHeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn credentials(request: &Request<Body>) -> RequestCredentials {
    RequestCredentials {
        path: request.uri().path().to_string(),
        authorization: header_value(request, header::AUTHORIZATION),
        operator_key: header_value(request, HeaderName::from_static(OPERATOR_KEY_HEADER)),
        project_id: header_value(request, HeaderName::from_static(PROJECT_ID_HEADER)),
    }
}

/// Principal + platform resolution and route protection.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match state.principals.resolve(&credentials(&request)).await {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };

    match caller {
        ResolvedCaller::Operator => {
            debug!(path = %request.uri().path(), "Operator request");
            request.extensions_mut().insert(OperatorAccess);
        }
        ResolvedCaller::Principal(principal) => {
            let host = header_value(&request, header::HOST);
            let platform_id = match state
                .platforms
                .resolve_platform_id(Some(&principal), host.as_deref())
                .await
            {
                Ok(platform_id) => platform_id,
                Err(e) => return e.into_response(),
            };

            request.extensions_mut().insert(ResolvedPlatform(platform_id));
            request.extensions_mut().insert(principal);
        }
    }

    next.run(request).await
}

/// Project-role gate. Requests without a principal (operator calls) pass.
pub async fn rbac_middleware(
    State(state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(principal) = request.extensions().get::<Principal>().cloned() {
        let method = request.method().as_str().to_string();
        let path = request.uri().path().to_string();

        if let Err(e) = state.rbac.authorize(&principal, &method, &path).await {
            return e.into_response();
        }
    }

    next.run(request).await
}
