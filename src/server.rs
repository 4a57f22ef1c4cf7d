//! Server runtime
//!
//! [`ServerHandle`] owns the full lifecycle: metrics recorder, database and
//! migrations, admin seeding, the overdue sweeper, the REST API and
//! graceful shutdown.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::{AdminSeed, BookingService, OverdueSweeper, UserService, VehicleService};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::interfaces::http::{create_api_router, AppServices};
use crate::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Options for starting the server.
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

/// Handle to a running rental service.
///
/// ```rust,no_run
/// use vehicle_rental::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), vehicle_rental::server::ServerError> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    /// Address the API is bound to (resolves port 0 to the real port)
    pub local_addr: std::net::SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownSignal,
    api_task: JoinHandle<()>,
    sweeper_task: Option<JoinHandle<()>>,
}

/// The global metrics recorder can only be installed once per process;
/// a restart within the same process reuses it.
fn prometheus_handle() -> Result<PrometheusHandle, ServerError> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("failed to install Prometheus recorder: {}", e))?;
    info!("Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

impl ServerHandle {
    /// Start the service:
    /// 1. Install the Prometheus recorder
    /// 2. Connect to the database and run migrations
    /// 3. Seed the administrator when no users exist
    /// 4. Start the overdue sweeper (if enabled)
    /// 5. Start the REST API (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, ServerError> {
        let app_cfg = opts.config;
        info!("Starting vehicle rental service...");

        let prometheus = prometheus_handle()?;

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database_config()).await?;
        if opts.auto_migrate {
            info!("Running database migrations...");
            run_migrations(&db).await?;
            info!("Migrations completed");
        }

        // ── Repositories & Services ────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let jwt_config = app_cfg.jwt_config();
        info!(
            expiration_hours = jwt_config.expiration_hours,
            "JWT configured"
        );

        let users = Arc::new(UserService::new(repos.clone(), jwt_config.clone()));
        let vehicles = Arc::new(VehicleService::new(repos.clone()));
        let bookings = Arc::new(BookingService::new(repos.clone()));

        let seed = AdminSeed {
            name: app_cfg.admin.name.clone(),
            email: app_cfg.admin.email.clone(),
            password: app_cfg.admin.password.clone(),
            phone: app_cfg.admin.phone.clone(),
        };
        match users.seed_admin(seed).await {
            Ok(Some(admin)) => {
                info!(email = %admin.email, "Default admin created");
                warn!("Please change the default admin password");
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "Failed to create default admin"),
        }

        let shutdown = ShutdownSignal::new();

        // ── Background tasks ───────────────────────────────────
        let sweeper_task = if app_cfg.sweeper.enabled {
            let sweeper = Arc::new(OverdueSweeper::new(
                repos.clone(),
                bookings.clone(),
                Duration::from_secs(app_cfg.sweeper.interval_secs),
            ));
            Some(sweeper.start(shutdown.clone()))
        } else {
            info!("Overdue sweeper disabled");
            None
        };

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(
            AppServices {
                users,
                vehicles,
                bookings,
            },
            jwt_config,
            Some(db.clone()),
            Some(prometheus),
        );

        let listener = tokio::net::TcpListener::bind(app_cfg.listen_addr()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API received shutdown signal");
        });
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
            sweeper_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Trigger shutdown on SIGTERM / SIGINT.
    pub fn install_signal_handler(&self) {
        listen_for_shutdown_signals(self.shutdown.clone());
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait until the API stops, then drain background tasks (bounded by
    /// `server.shutdown_timeout`) and close the database.
    pub async fn wait(self) {
        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        // The API can also stop on its own (bind loss); make sure the
        // sweeper follows it down.
        self.shutdown.trigger();

        if let Some(task) = self.sweeper_task {
            let grace = Duration::from_secs(self.config.server.shutdown_timeout);
            match tokio::time::timeout(grace, task).await {
                Ok(Ok(())) => info!("Overdue sweeper stopped"),
                Ok(Err(e)) => error!("Overdue sweeper task panicked: {}", e),
                Err(_) => warn!(
                    timeout_secs = grace.as_secs(),
                    "Overdue sweeper did not stop in time"
                ),
            }
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }
        info!("Shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the application config. `RUST_LOG` wins over
/// `logging.level`.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
