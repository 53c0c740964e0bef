//! Route protection policy
//!
//! Deny by default: a path needs an authenticated principal unless it is
//! listed here as public. Operator routes are gated by the global key.

const EXEMPT_PATHS: &[&str] = &[
    "/v1/health",
    "/v1/authentication/sign-in",
    "/v1/authentication/sign-up",
    "/v1/authentication/federated/login",
    "/v1/flags",
];

const EXEMPT_PREFIXES: &[&str] = &["/v1/webhooks", "/v1/forms", "/docs", "/api-docs", "/assets"];

const OPERATOR_PREFIXES: &[&str] = &["/v1/admin"];

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    exempt_paths: Vec<String>,
    exempt_prefixes: Vec<String>,
    operator_prefixes: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            exempt_paths: owned(EXEMPT_PATHS),
            exempt_prefixes: owned(EXEMPT_PREFIXES),
            operator_prefixes: owned(OPERATOR_PREFIXES),
        }
    }
}

impl RoutePolicy {
    /// Add a public path on top of the defaults.
    pub fn with_exempt_path(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        let path = trim_trailing_slash(path);
        self.exempt_paths.iter().any(|p| p == path)
            || self.exempt_prefixes.iter().any(|p| under_prefix(path, p))
    }

    pub fn is_operator_route(&self, path: &str) -> bool {
        let path = trim_trailing_slash(path);
        self.operator_prefixes.iter().any(|p| under_prefix(path, p))
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// `prefix` itself or anything below it, on a segment boundary.
fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_routes_require_authentication() {
        let policy = RoutePolicy::default();
        assert!(!policy.is_exempt("/v1/flows"));
        assert!(!policy.is_exempt("/v1/usage"));
        assert!(!policy.is_exempt("/v1/healthz"));
    }

    #[test]
    fn public_routes_are_exempt() {
        let policy = RoutePolicy::default();
        assert!(policy.is_exempt("/v1/health"));
        assert!(policy.is_exempt("/v1/authentication/sign-in/"));
        assert!(policy.is_exempt("/v1/webhooks/abc/sync"));
        assert!(policy.is_exempt("/docs"));
        assert!(!policy.is_exempt("/docsecret"));
    }

    #[test]
    fn operator_routes_are_recognized() {
        let policy = RoutePolicy::default();
        assert!(policy.is_operator_route("/v1/admin/metrics"));
        assert!(!policy.is_operator_route("/v1/administrators"));
    }

    #[test]
    fn extra_exempt_paths_can_be_added() {
        let policy = RoutePolicy::default().with_exempt_path("/v1/status");
        assert!(policy.is_exempt("/v1/status"));
    }
}
