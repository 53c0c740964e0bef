//! Configuration module
//!
//! Reads `config.toml` (default `~/.config/control-plane/config.toml`) and
//! layers environment overrides for secrets and deployment flags on top.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{DeploymentMode, Edition};
use crate::shared::{ControlPlaneError, DomainResult};

const APP_DIR: &str = "control-plane";

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Default location of the generated signing secret on single-node installs.
pub fn default_secret_path() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("jwt-secret")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./control-plane.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared signing secret. Required on multi-node deployments.
    pub jwt_secret: Option<String>,
    pub token_expiration_days: i64,
    pub issuer: String,
    /// Where a generated secret is persisted on single-node deployments.
    pub secret_file: Option<PathBuf>,
    /// Global operator key for the operator-only routes.
    pub api_key: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiration_days: 7,
            issuer: "control-plane".to_string(),
            secret_file: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub edition: Edition,
    pub mode: DeploymentMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Upper bound for acquiring the plan-creation lock.
    pub lock_timeout_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            lock_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub deployment: DeploymentConfig,
    pub quota: QuotaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {}", e),
            Self::Parse(e) => write!(f, "cannot parse config: {}", e),
            Self::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Load from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let mut cfg = Self::from_toml(&raw)?;
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(ConfigError::Parse)
    }

    /// Overrides: `CP_JWT_SECRET`, `CP_API_KEY`, `CP_EDITION`,
    /// `CP_DEPLOYMENT_MODE`, `DATABASE_URL`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(secret) = non_empty_env("CP_JWT_SECRET") {
            self.security.jwt_secret = Some(secret);
        }
        if let Some(key) = non_empty_env("CP_API_KEY") {
            self.security.api_key = Some(key);
        }
        if let Some(edition) = non_empty_env("CP_EDITION") {
            self.deployment.edition = edition.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(mode) = non_empty_env("CP_DEPLOYMENT_MODE") {
            self.deployment.mode = mode.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(url) = non_empty_env("DATABASE_URL") {
            self.database.url = url;
        }
        Ok(())
    }

    /// Read a named setting; `None` when unset.
    pub fn get(&self, setting: Setting) -> Option<String> {
        match setting {
            Setting::JwtSecret => self.security.jwt_secret.clone().filter(|s| !s.is_empty()),
            Setting::ApiKey => self.security.api_key.clone().filter(|s| !s.is_empty()),
            Setting::Edition => Some(self.deployment.edition.to_string()),
            Setting::DeploymentMode => Some(
                match self.deployment.mode {
                    DeploymentMode::SingleNode => "single_node",
                    DeploymentMode::MultiNode => "multi_node",
                }
                .to_string(),
            ),
            Setting::DatabaseUrl => Some(self.database.url.clone()).filter(|s| !s.is_empty()),
        }
    }

    /// Read a required setting.
    pub fn get_or_throw(&self, setting: Setting) -> DomainResult<String> {
        self.get(setting)
            .ok_or_else(|| ControlPlaneError::configuration(setting.key()))
    }

    pub fn edition(&self) -> Edition {
        self.deployment.edition
    }

    pub fn secret_file(&self) -> PathBuf {
        self.security
            .secret_file
            .clone()
            .unwrap_or_else(default_secret_path)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Settings that other components look up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    JwtSecret,
    ApiKey,
    Edition,
    DeploymentMode,
    DatabaseUrl,
}

impl Setting {
    pub fn key(&self) -> &'static str {
        match self {
            Self::JwtSecret => "security.jwt_secret",
            Self::ApiKey => "security.api_key",
            Self::Edition => "deployment.edition",
            Self::DeploymentMode => "deployment.mode",
            Self::DatabaseUrl => "database.url",
        }
    }
}
