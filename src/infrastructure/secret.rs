//! Signing secret provider
//!
//! Resolution order: configured secret → secret persisted by an earlier
//! single-node run → freshly generated 32 random bytes (persisted).
//! Multi-node deployments must configure the secret.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{AppConfig, Setting};
use crate::domain::DeploymentMode;
use crate::shared::{ControlPlaneError, DomainResult};

/// Raw key material. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

/// Lazily resolves the process-wide signing secret exactly once.
pub struct SecretProvider {
    configured: Option<String>,
    mode: DeploymentMode,
    secret_file: PathBuf,
    cell: OnceCell<Arc<SigningSecret>>,
}

impl SecretProvider {
    pub fn new(configured: Option<String>, mode: DeploymentMode, secret_file: PathBuf) -> Self {
        Self {
            configured: configured.filter(|s| !s.is_empty()),
            mode,
            secret_file,
            cell: OnceCell::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.get(Setting::JwtSecret),
            config.deployment.mode,
            config.secret_file(),
        )
    }

    /// Concurrent first callers wait on a single resolution, so at most one
    /// generate-and-persist ever runs per process.
    pub async fn get_secret(&self) -> DomainResult<Arc<SigningSecret>> {
        self.cell
            .get_or_try_init(|| self.resolve())
            .await
            .map(Arc::clone)
    }

    async fn resolve(&self) -> DomainResult<Arc<SigningSecret>> {
        if let Some(secret) = &self.configured {
            return Ok(Arc::new(SigningSecret::new(secret.as_bytes())));
        }

        if self.mode == DeploymentMode::MultiNode {
            return Err(ControlPlaneError::configuration(Setting::JwtSecret.key()));
        }

        if let Some(secret) = load_persisted(&self.secret_file).await? {
            info!(path = %self.secret_file.display(), "Loaded persisted signing secret");
            return Ok(Arc::new(secret));
        }

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        persist(&self.secret_file, &bytes).await?;
        info!(path = %self.secret_file.display(), "Generated new signing secret");

        Ok(Arc::new(SigningSecret::new(bytes.to_vec())))
    }
}

async fn load_persisted(path: &Path) -> DomainResult<Option<SigningSecret>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ControlPlaneError::Internal(format!("read secret file: {}", e))),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match STANDARD.decode(trimmed) {
        Ok(bytes) if !bytes.is_empty() => Ok(Some(SigningSecret::new(bytes))),
        _ => {
            warn!(path = %path.display(), "Persisted signing secret is not valid base64");
            Err(ControlPlaneError::configuration("security.secret_file"))
        }
    }
}

/// Write to a sibling temp file then rename, so readers never see a
/// partially written secret.
async fn persist(path: &Path, bytes: &[u8]) -> DomainResult<()> {
    let io_err = |e: std::io::Error| ControlPlaneError::Internal(format!("persist secret: {}", e));

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, STANDARD.encode(bytes)).await.map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(io_err)?;
    }

    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
