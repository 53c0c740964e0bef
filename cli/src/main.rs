//! Control plane CLI server
//!
//! ```sh
//! # Default config (~/.config/control-plane/config.toml)
//! control-plane
//!
//! # Custom config path
//! control-plane --config /etc/control-plane/config.toml
//!
//! # Validate config without starting
//! control-plane --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use control_plane::config::AppConfig;
use control_plane::server::{init_tracing, ServerHandle, ServerOptions};

/// Multi-tenant control plane: tenancy, authorization and quotas.
#[derive(Parser, Debug)]
#[command(
    name = "control-plane",
    version,
    about = "Multi-tenant control plane server",
    long_about = "Resolves tenants and principals, enforces project roles and usage quotas.\n\n\
                  Default config: ~/.config/control-plane/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "CONTROL_PLANE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(control_plane::default_config_path);

    let file_exists = config_path.exists();
    let mut config = if file_exists {
        AppConfig::load(&config_path)?
    } else {
        let mut cfg = AppConfig::default();
        cfg.apply_env()?;
        cfg
    };

    // ── Apply CLI overrides ────────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config);
    if file_exists {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        warn!(
            "No config file at {}; using defaults and environment",
            config_path.display()
        );
    }

    // ── Config validation mode ─────────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.server.address());
        println!("   Database    : {}", config.database.url);
        println!("   Edition     : {}", config.edition());
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
