//! JWT Token handling
//!
//! HS256 only. The payload is flattened next to the registered claims, so
//! any serializable payload can be signed.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Signing algorithm; the only one accepted on verification.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Key identifier written into every token header.
pub const KEY_ID: &str = "1";

/// Registered claims wrapped around a payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims<T> {
    #[serde(flatten)]
    pub payload: T,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl<T> TokenClaims<T> {
    pub fn new(payload: T, issuer: &str, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            payload,
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
            iss: issuer.to_string(),
        }
    }
}

/// Sign `payload` with the shared secret.
pub fn create_token<T: Serialize>(
    payload: &T,
    secret: &[u8],
    issuer: &str,
    expires_in: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(payload, issuer, expires_in);
    let mut header = Header::new(ALGORITHM);
    header.kid = Some(KEY_ID.to_string());

    encode(&header, &claims, &EncodingKey::from_secret(secret))
}

/// Verify signature, algorithm, issuer and expiry, then return the payload.
pub fn verify_token<T: DeserializeOwned>(
    token: &str,
    secret: &[u8],
    issuer: &str,
) -> Result<T, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(ALGORITHM);
    validation.algorithms = vec![ALGORITHM];
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.leeway = 0;

    let token_data = decode::<TokenClaims<T>>(token, &DecodingKey::from_secret(secret), &validation)?;

    Ok(token_data.claims.payload)
}

/// Read the raw claims without checking anything. Never authorize on this.
pub fn decode_unverified(token: &str) -> Result<serde_json::Value, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(ALGORITHM);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<serde_json::Value>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(token_data.claims)
}
