//! Control plane server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, database
//! and migrations, signing secret, services, the REST API and graceful
//! shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::DeploymentMode;
use crate::infrastructure::{
    init_database, run_migrations, DatabaseConfig, MemoryLockService, SecretProvider,
};
use crate::interfaces::http::{create_api_router, AppState};
use crate::notifications::{create_event_bus, Event, SharedEventBus};
use crate::shared::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running control plane.
///
/// ```rust,no_run
/// use control_plane::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub config: AppConfig,
    /// Address the API is bound to; differs from the config when port 0
    /// was requested.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    event_log_task: JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        info!(edition = %config.edition(), "Starting control plane");

        let prometheus = prometheus_handle();

        // ── Database ───────────────────────────────────────────
        let db_config = DatabaseConfig::from(&config.database);
        let db = init_database(&db_config).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }

        // ── Signing secret ─────────────────────────────────────
        // Resolved eagerly so a multi-node deployment without a configured
        // secret refuses to start.
        let secrets = Arc::new(SecretProvider::from_config(&config));
        secrets.get_secret().await?;

        // ── Services ───────────────────────────────────────────
        if matches!(config.deployment.mode, DeploymentMode::MultiNode) {
            warn!("Named locks are process-local; instances converge on plans through insert-or-keep");
        }
        let event_bus = create_event_bus();
        let state = AppState::new(
            db.clone(),
            &config,
            secrets,
            Arc::new(MemoryLockService::new()),
            event_bus.clone(),
            prometheus,
        );

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let event_log_task = spawn_event_log(event_bus.clone(), shutdown.signal());

        // ── REST API ───────────────────────────────────────────
        let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let router = create_api_router(state);
        let api_shutdown = shutdown.signal();
        let api_task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API received shutdown signal");
            });
            if let Err(e) = server.await {
                error!(error = %e, "REST API server error");
            }
        });

        Ok(Self {
            event_bus,
            config,
            local_addr,
            db,
            shutdown,
            api_task,
            event_log_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM/SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to stop after shutdown has been triggered. In-flight
    /// requests get the configured grace period.
    pub async fn wait(self) {
        let grace = self.shutdown.timeout();

        match tokio::time::timeout(grace, self.api_task).await {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!(error = %e, "REST API server task panicked"),
            Err(_) => warn!(grace_secs = grace.as_secs(), "REST API did not drain in time"),
        }
        self.event_log_task.abort();

        if let Err(e) = self.db.close().await {
            warn!(error = %e, "Error closing database connection");
        } else {
            info!("Database connection closed");
        }

        info!("Control plane shutdown complete");
    }

    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can only be installed once per process; restarts
/// within one process reuse it.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                handle
            }
            Err(e) => {
                warn!(error = %e, "Another metrics recorder is installed; exposition stays empty");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Log every published event. Mail dispatch subscribes the same way.
fn spawn_event_log(bus: SharedEventBus, shutdown: ShutdownSignal) -> JoinHandle<()> {
    let mut subscriber = bus.subscribe();
    tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                message = subscriber.recv() => message,
                _ = shutdown.wait() => break,
            };
            let Some(message) = message else { break };

            match &message.event {
                Event::UsageAlert(alert) => info!(
                    project_id = %alert.project_id,
                    template = %alert.template,
                    "Usage alert"
                ),
                Event::PlanChanged(change) => info!(
                    project_id = %change.project_id,
                    plan = %change.plan,
                    tasks = change.tasks,
                    "Plan changed"
                ),
            }
        }
    })
}

/// Initialize tracing from the logging config. `RUST_LOG` wins over
/// `logging.level` when set.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
