//! API Key generation and hashing

use rand::Rng;
use sha2::{Digest, Sha256};

/// Literal prefix that tells tenant API keys apart from bearer tokens.
pub const API_KEY_PREFIX: &str = "sk-";

/// Result of API key generation
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full API key (only shown once!)
    pub key: String,
    /// SHA-256 of the full key, hex encoded
    pub key_hash: String,
    /// Display form, e.g. `sk-1a2b3c4d...`
    pub truncated: String,
}

/// Generate a new API key: `sk-<64 hex chars>`.
pub fn generate_api_key() -> GeneratedApiKey {
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; 32] = rng.gen();
    let random_hex = hex::encode(random_bytes);

    let key = format!("{}{}", API_KEY_PREFIX, random_hex);
    let key_hash = hash_api_key(&key);
    let truncated = format!("{}{}...", API_KEY_PREFIX, &random_hex[..8]);

    GeneratedApiKey {
        key,
        key_hash,
        truncated,
    }
}

/// Hash an API key for storage using SHA-256
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check if a credential carries the API key prefix
pub fn is_api_key_format(credential: &str) -> bool {
    credential.starts_with(API_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key() {
        let generated = generate_api_key();

        assert!(generated.key.starts_with(API_KEY_PREFIX));
        assert_eq!(generated.key.len(), API_KEY_PREFIX.len() + 64);
        assert!(is_api_key_format(&generated.key));
        assert_eq!(hash_api_key(&generated.key), generated.key_hash);
        assert_ne!(hash_api_key("wrong-key"), generated.key_hash);
        assert!(generated.truncated.ends_with("..."));
    }

    #[test]
    fn bearer_tokens_are_not_api_keys() {
        assert!(!is_api_key_format("eyJhbGciOiJIUzI1NiJ9.e30.sig"));
    }
}
