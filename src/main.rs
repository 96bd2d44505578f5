//! gpfs-exporter - version 0.1.0
//!
//! Prometheus exporter for GPFS administrative command output.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use gpfs_exporter::collector::{DEFAULT_MMFS_BIN_DIR, DEFAULT_PROC_MOUNTS};
use gpfs_exporter::collectors::default_registry;
use gpfs_exporter::runner::SystemRunner;
use gpfs_exporter::{CollectorContext, CollectorRegistry, GpfsCollector};
use prometheus::{Gauge, Registry};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_collectors, command_config, command_test};
use config::{
    effective_log_level, resolve_config, show_config, validate_effective_config, Config,
    DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, root_handler};
use state::{AppState, CollectorInfo};

/// Initializes tracing logging subsystem with configured log level.
/// The level was checked by `validate_effective_config`.
fn setup_logging(config: &Config) {
    let level = effective_log_level(config).unwrap_or(LogLevel::Info);
    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };
    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Builds the dependencies handed to every collector factory.
fn collector_context(config: &Config) -> CollectorContext {
    let runner = SystemRunner::new(config.use_sudo.unwrap_or(true));
    CollectorContext {
        mmfs_bin_dir: bin_dir(config),
        proc_mounts: config
            .proc_mounts
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_MOUNTS)),
        mounts: config.mounts.clone().unwrap_or_default(),
        ..CollectorContext::new(Arc::new(runner))
    }
}

fn bin_dir(config: &Config) -> PathBuf {
    config
        .mmfs_bin_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MMFS_BIN_DIR))
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(
    args: &Args,
    registry: &CollectorRegistry,
) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config, &registry.names()) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = default_registry()?;
    let (args, matches) = Args::parse_with(&registry);

    let config = load_validated_config(&args, &registry)?;

    setup_logging(&config);

    if args.check_config {
        println!("✅ Configuration is valid");
        return Ok(());
    }
    if args.show_config {
        return show_config(&config, args.config_format.clone());
    }

    // Precedence: flags > config file > registration default
    registry.apply_config(&config.collectors)?;
    registry.apply_matches(&matches);

    if let Some(command) = &args.command {
        return match command {
            Commands::Check => command_check(&config, &registry, &bin_dir(&config)),
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), format.clone(), *commented),
            Commands::Collectors => command_collectors(&registry),
            Commands::Test { iterations } => {
                let collector = GpfsCollector::build(&registry, &collector_context(&config))?;
                command_test(*iterations, collector)
            }
        };
    }

    info!("Starting gpfs-exporter");

    let mounts_configured = config.mounts.as_ref().is_some_and(|m| !m.is_empty());
    let binaries: Vec<&str> = registry
        .entries()
        .filter(|e| e.enabled())
        .flat_map(|e| startup_checks::required_binaries(e.name(), mounts_configured).iter().copied())
        .collect();
    if let Err(e) = startup_checks::validate_requirements(
        &bin_dir(&config),
        config.use_sudo.unwrap_or(true),
        &binaries,
    ) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The exporter will start but affected collectors will report collect_error=1");
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let collector = GpfsCollector::build(&registry, &collector_context(&config))?;
    let status = collector.status();
    info!("Enabled collectors: {}", collector.names().join(", "));

    // Initialize Prometheus metrics registry
    let prom_registry = Registry::new();
    prom_registry.register(Box::new(collector))?;

    let scrape_duration = Gauge::new(
        "gpfs_exporter_scrape_duration_seconds",
        "Time spent serving the previous /metrics request",
    )?;
    prom_registry.register(Box::new(scrape_duration.clone()))?;
    debug!("All metrics registered successfully");

    let collectors = registry
        .entries()
        .map(|e| CollectorInfo {
            name: e.name().to_string(),
            default_enabled: e.default_enabled(),
            enabled: e.enabled(),
        })
        .collect();

    let state = Arc::new(AppState {
        registry: prom_registry,
        scrape_duration,
        status,
        collectors,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    if config.enable_tls.unwrap_or(false) {
        // Both paths are present: validate_effective_config() rejects TLS without them
        let cert_path = config.tls_cert_path.as_deref().unwrap_or_default();
        let key_path = config.tls_key_path.as_deref().unwrap_or_default();

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!("gpfs-exporter listening on https://{}:{}", bind_ip_str, port);

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal => {
                info!("Shutdown signal received, exiting...");
            }
        }
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!("gpfs-exporter listening on http://{}:{}", bind_ip_str, port);

        let server = axum::serve(listener, app);

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal => {
                info!("Shutdown signal received, exiting...");
            }
        }
    }

    info!("gpfs-exporter stopped gracefully");
    Ok(())
}
