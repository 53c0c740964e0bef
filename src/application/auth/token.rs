//! Token service
//!
//! Signs principals into compact HS256 tokens and verifies them. Every
//! verification failure surfaces as the same `InvalidCredential`.

use std::sync::Arc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::{ControlPlaneError, DomainResult, Principal};
use crate::infrastructure::crypto::jwt::{create_token, decode_unverified, verify_token};
use crate::infrastructure::SecretProvider;

pub const DEFAULT_TOKEN_DAYS: i64 = 7;

pub struct TokenService {
    secrets: Arc<SecretProvider>,
    issuer: String,
    default_expiry: Duration,
}

impl TokenService {
    pub fn new(secrets: Arc<SecretProvider>, issuer: impl Into<String>, default_expiry: Duration) -> Self {
        Self {
            secrets,
            issuer: issuer.into(),
            default_expiry,
        }
    }

    pub fn from_config(secrets: Arc<SecretProvider>, config: &AppConfig) -> Self {
        let days = if config.security.token_expiration_days > 0 {
            config.security.token_expiration_days
        } else {
            DEFAULT_TOKEN_DAYS
        };
        Self::new(secrets, config.security.issuer.clone(), Duration::days(days))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign a principal with the default lifetime.
    pub async fn sign(&self, principal: &Principal) -> DomainResult<String> {
        self.sign_with_expiry(principal, self.default_expiry).await
    }

    /// Sign any payload with a caller-chosen lifetime, e.g. one day for
    /// invitation tokens.
    pub async fn sign_with_expiry<T: Serialize + Sync>(
        &self,
        payload: &T,
        expires_in: Duration,
    ) -> DomainResult<String> {
        let secret = self.secrets.get_secret().await?;
        create_token(payload, secret.as_bytes(), &self.issuer, expires_in)
            .map_err(|e| ControlPlaneError::Internal(format!("sign token: {}", e)))
    }

    pub async fn decode_and_verify<T: DeserializeOwned>(&self, token: &str) -> DomainResult<T> {
        let secret = self.secrets.get_secret().await?;
        verify_token(token, secret.as_bytes(), &self.issuer).map_err(|e| {
            debug!(error = %e, "Token rejected");
            ControlPlaneError::InvalidCredential
        })
    }

    /// Read the payload without any verification. Never authorize on it.
    pub fn decode(&self, token: &str) -> DomainResult<serde_json::Value> {
        decode_unverified(token).map_err(|_| ControlPlaneError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeploymentMode, PlatformContext, PlatformRole, ProjectType};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    fn service(secret: &str, issuer: &str) -> TokenService {
        let secrets = SecretProvider::new(
            Some(secret.to_string()),
            DeploymentMode::MultiNode,
            std::env::temp_dir().join("unused-secret"),
        );
        TokenService::new(Arc::new(secrets), issuer, Duration::days(7))
    }

    fn user() -> Principal {
        Principal::user(
            "u1",
            "p1",
            ProjectType::PlatformManaged,
            Some(PlatformContext {
                id: "plat-1".into(),
                role: PlatformRole::Member,
            }),
        )
    }

    #[tokio::test]
    async fn sign_then_verify_round_trips_the_principal() {
        let tokens = service("secret", "control-plane");
        let token = tokens.sign(&user()).await.unwrap();

        let decoded: Principal = tokens.decode_and_verify(&token).await.unwrap();
        assert_eq!(decoded, user());
    }

    #[tokio::test]
    async fn principal_without_platform_round_trips_as_none() {
        let tokens = service("secret", "control-plane");
        let principal = Principal::user("u1", "p1", ProjectType::Standalone, None);
        let token = tokens.sign(&principal).await.unwrap();

        let raw = tokens.decode(&token).unwrap();
        assert!(raw.get("platform").is_none());

        let decoded: Principal = tokens.decode_and_verify(&token).await.unwrap();
        assert_eq!(decoded.platform, None);
    }

    #[tokio::test]
    async fn expired_token_is_an_invalid_credential() {
        let tokens = service("secret", "control-plane");
        let token = tokens
            .sign_with_expiry(&user(), Duration::seconds(-5))
            .await
            .unwrap();

        let err = tokens.decode_and_verify::<Principal>(&token).await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::InvalidCredential));
    }

    #[tokio::test]
    async fn other_secret_or_issuer_is_rejected_the_same_way() {
        let token = service("secret", "control-plane").sign(&user()).await.unwrap();

        for verifier in [service("other", "control-plane"), service("secret", "elsewhere")] {
            let err = verifier.decode_and_verify::<Principal>(&token).await.unwrap_err();
            assert_eq!(err.to_string(), "Invalid credential");
        }
    }

    #[tokio::test]
    async fn other_algorithm_is_rejected() {
        let claims = serde_json::json!({
            "id": "u1",
            "type": "USER",
            "projectId": "p1",
            "projectType": "STANDALONE",
            "iss": "control-plane",
            "iat": chrono::Utc::now().timestamp(),
            "exp": chrono::Utc::now().timestamp() + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = service("secret", "control-plane")
            .decode_and_verify::<Principal>(&token)
            .await
            .unwrap_err();
        assert!(matches!(err, ControlPlaneError::InvalidCredential));
    }

    #[tokio::test]
    async fn garbage_is_an_invalid_credential() {
        let tokens = service("secret", "control-plane");
        assert!(matches!(
            tokens.decode_and_verify::<Principal>("not.a.token").await,
            Err(ControlPlaneError::InvalidCredential)
        ));
        assert!(tokens.decode("garbage").is_err());
    }

    #[tokio::test]
    async fn invitation_payloads_can_be_signed() {
        #[derive(Serialize, serde::Deserialize)]
        struct Invitation {
            id: String,
        }

        let tokens = service("secret", "control-plane");
        let token = tokens
            .sign_with_expiry(&Invitation { id: "inv-1".into() }, Duration::days(1))
            .await
            .unwrap();

        assert_eq!(tokens.decode(&token).unwrap()["id"], "inv-1");
        let verified: Invitation = tokens.decode_and_verify(&token).await.unwrap();
        assert_eq!(verified.id, "inv-1");
    }
}
