//! Vehicle rental service
//!
//! ```sh
//! # Run with default config (~/.config/vehicle-rental/config.toml)
//! vehicle-rental
//!
//! # Custom config path and port
//! vehicle-rental --config /etc/vehicle-rental/config.toml --port 8080
//!
//! # Validate config without starting
//! vehicle-rental --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use vehicle_rental::config::AppConfig;
use vehicle_rental::server::{init_tracing, ServerError, ServerHandle, ServerOptions};

/// Vehicle rental booking service.
#[derive(Parser, Debug)]
#[command(
    name = "vehicle-rental",
    version,
    about = "Vehicle rental booking service",
    long_about = "REST API for vehicles, customers and bookings.\n\n\
                  Default config: ~/.config/vehicle-rental/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "RENTAL_CONFIG")]
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
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(vehicle_rental::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // CLI overrides go in before tracing so --log-level takes effect.
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    if cli.check {
        if let Some(e) = load_error {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
        if let Err(e) = config.validate() {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Listen      : {}", config.listen_addr());
        println!("   Database    : {}", config.database_config().redacted_url());
        if config.sweeper.enabled {
            println!("   Sweeper     : every {}s", config.sweeper.interval_secs);
        } else {
            println!("   Sweeper     : disabled");
        }
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    config.validate()?;

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;
    Ok(())
}
