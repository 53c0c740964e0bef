//! Platform resolver
//!
//! Attributes a request to a tenant: trusted principal context first, then
//! the custom-domain registry, then (single-tenant editions only) the
//! oldest platform.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{DomainResult, Edition, Principal, RepositoryProvider};

pub struct PlatformResolver {
    repos: Arc<dyn RepositoryProvider>,
    edition: Edition,
}

impl PlatformResolver {
    pub fn new(repos: Arc<dyn RepositoryProvider>, edition: Edition) -> Self {
        Self { repos, edition }
    }

    pub async fn resolve_platform_id(
        &self,
        principal: Option<&Principal>,
        host: Option<&str>,
    ) -> DomainResult<Option<String>> {
        if let Some(platform_id) = principal.and_then(Principal::platform_id) {
            return Ok(Some(platform_id.to_string()));
        }

        if let Some(hostname) = host.and_then(normalize_host) {
            if let Some(domain) = self.repos.custom_domains().find_by_domain(&hostname).await? {
                debug!(%hostname, platform_id = %domain.platform_id, "Platform resolved by custom domain");
                return Ok(Some(domain.platform_id));
            }
        }

        if self.edition.is_single_tenant() {
            let oldest = self.repos.platforms().find_oldest().await?;
            return Ok(oldest.map(|p| p.id));
        }

        Ok(None)
    }
}

/// Lowercased hostname without port.
fn normalize_host(host: &str) -> Option<String> {
    let host = host.trim();
    let hostname = match host.strip_prefix('[') {
        // IPv6 literal, e.g. [::1]:8080
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => host.split(':').next().unwrap_or(host),
    };
    let hostname = hostname.trim_end_matches('.');
    (!hostname.is_empty()).then(|| hostname.to_ascii_lowercase())
}
