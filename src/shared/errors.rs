use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metered resource named in a quota violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaMetric {
    Tasks,
    TeamMembers,
    Connections,
}

impl QuotaMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::TeamMembers => "team_members",
            Self::Connections => "connections",
        }
    }
}

impl fmt::Display for QuotaMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Malformed, expired, wrongly signed or wrongly issued token.
    /// Never says which check failed.
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Authentication required")]
    InvalidBearerToken,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Permission denied: {action} on {resource}")]
    PermissionDenied { resource: String, action: String },

    #[error("Quota exceeded for {metric}: limit is {quota}")]
    QuotaExceeded { metric: QuotaMetric, quota: i64 },

    #[error("Not found: {entity} with id={id}")]
    EntityNotFound { entity: &'static str, id: String },

    #[error("Missing or invalid configuration setting: {setting}")]
    ConfigurationInvalid { setting: String },

    #[error("Timed out acquiring lock {key}")]
    LockTimeout { key: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ControlPlaneError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn configuration(setting: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            setting: setting.into(),
        }
    }

    /// Faults of the surrounding infrastructure rather than decisions of
    /// this core. Quota enforcement and alerting let these through.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout { .. } | Self::Database(_) | Self::Internal(_)
        )
    }

    /// Stable machine-readable code surfaced at the network boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::InvalidBearerToken => "INVALID_BEARER_TOKEN",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            Self::ConfigurationInvalid { .. } => "CONFIGURATION_INVALID",
            Self::LockTimeout { .. } | Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, ControlPlaneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_errors_are_classified() {
        assert!(ControlPlaneError::LockTimeout { key: "k".into() }.is_infrastructure());
        assert!(ControlPlaneError::Internal("boom".into()).is_infrastructure());
        assert!(!ControlPlaneError::QuotaExceeded {
            metric: QuotaMetric::Tasks,
            quota: 10
        }
        .is_infrastructure());
        assert!(!ControlPlaneError::InvalidCredential.is_infrastructure());
    }

    #[test]
    fn credential_message_does_not_leak_reason() {
        assert_eq!(ControlPlaneError::InvalidCredential.to_string(), "Invalid credential");
        assert_eq!(ControlPlaneError::InvalidCredential.code(), "INVALID_CREDENTIAL");
    }

    #[test]
    fn quota_metric_serializes_snake_case() {
        let json = serde_json::to_string(&QuotaMetric::TeamMembers).unwrap();
        assert_eq!(json, "\"team_members\"");
    }
}
