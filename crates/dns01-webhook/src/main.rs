// # dns01-webhook - ACME DNS-01 webhook for bunny.net
//
// The webhook is responsible for:
// 1. Reading configuration from environment variables
// 2. Building the solver from the bunny.net provider and the Kubernetes
//    secret store
// 3. Initializing the solver against the API server
// 4. Serving challenge requests over HTTPS until SIGTERM / SIGINT
//
// This is a thin integration layer: all challenge logic lives in
// dns01-core. See `config.rs` for the environment variables.
//
// ## Example
//
// ```bash
// export GROUP_NAME=acme.example.com
// export DNS01_LOG_LEVEL=debug
// export DNS01_TLS_CERT_FILE=/tls/tls.crt
// export DNS01_TLS_KEY_FILE=/tls/tls.key
//
// dns01-webhook
// ```

mod config;
mod payload;
mod server;
mod tls;

use actix_web::{App, HttpServer, web};
use anyhow::Result;
use config::{Config, Mode};
use dns01_core::traits::{SecretStoreFactory, ZoneProviderFactory};
use dns01_core::{Dns01Solver, HostConfig, SolverRegistry, SolverSettings};
use server::WebhookState;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Seconds in-flight requests get to finish after a shutdown signal
const SHUTDOWN_GRACE_SECS: u64 = 30;

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error (including failed initialization)
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WebhookExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WebhookExitCode> for ExitCode {
    fn from(code: WebhookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    info!(group = %config.group_name, "Starting dns01-webhook");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebhookExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let registry = match startup(&config, &shutdown_rx).await {
            Ok(registry) => registry,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return WebhookExitCode::ConfigError;
            }
        };

        match serve(&config, registry, shutdown_tx).await {
            Ok(()) => WebhookExitCode::CleanShutdown,
            Err(e) => {
                error!("Webhook error: {:#}", e);
                WebhookExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Build and initialize the solvers
async fn startup(
    config: &Config,
    shutdown: &watch::Receiver<bool>,
) -> Result<Arc<SolverRegistry>> {
    let settings =
        SolverSettings::new(config.group_name.as_str())?.with_record_ttl(config.record_ttl()?);

    let secret_stores = secret_store_factory();
    let host = match secret_stores {
        Some(_) => config.host_config()?,
        None => HostConfig::default(),
    };

    let solver = Dns01Solver::new(settings, provider_factory(config)?, secret_stores)?;

    let registry = SolverRegistry::new();
    registry.register(Arc::new(solver));

    info!(api_url = %host.api_url, "Initializing solvers");
    registry.initialize_all(&host, shutdown).await?;

    info!(solvers = ?registry.list_solvers(), "Solvers initialized");
    Ok(Arc::new(registry))
}

#[cfg(feature = "bunny")]
fn provider_factory(config: &Config) -> Result<Arc<dyn ZoneProviderFactory>> {
    let factory = dns01_provider_bunny::BunnyProviderFactory::new()?
        .with_base_url(config.bunny_api_base_url.as_str())
        .with_dry_run(config.mode()? == Mode::DryRun);

    info!(base_url = factory.base_url(), mode = %config.mode, "Using bunny.net provider");
    Ok(Arc::new(factory))
}

#[cfg(not(feature = "bunny"))]
fn provider_factory(config: &Config) -> Result<Arc<dyn ZoneProviderFactory>> {
    if config.mode()? == Mode::Live {
        anyhow::bail!("built without the `bunny` feature; only DNS01_MODE=dry-run is available");
    }

    warn!("bunny feature disabled: records are kept in memory only");
    Ok(Arc::new(dns01_core::MemoryZoneProvider::new()))
}

#[cfg(feature = "kube")]
fn secret_store_factory() -> Option<Arc<dyn SecretStoreFactory>> {
    Some(Arc::new(dns01_secrets_kube::KubeSecretStoreFactory))
}

#[cfg(not(feature = "kube"))]
fn secret_store_factory() -> Option<Arc<dyn SecretStoreFactory>> {
    warn!("kube feature disabled: only inline access keys are accepted");
    None
}

/// Serve challenge requests until a shutdown signal arrives
async fn serve(
    config: &Config,
    registry: Arc<SolverRegistry>,
    shutdown_tx: watch::Sender<bool>,
) -> Result<()> {
    let addr = config.socket_addr()?;

    let state = web::Data::new(WebhookState {
        group_name: config.group_name.clone(),
        registry,
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(server::configure)
    });

    let server = match config.tls_files() {
        Some((cert, key)) => {
            let tls_config = tls::load_server_config(&cert, &key)?;
            info!(%addr, cert = %cert.display(), "Webhook listening (HTTPS)");
            server.bind_rustls_0_23(addr, tls_config)
        }
        None => {
            warn!(%addr, "No serving certificate configured; listening on plain HTTP");
            server.bind(addr)
        }
    }
    .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?
    .disable_signals()
    .shutdown_timeout(SHUTDOWN_GRACE_SECS)
    .run();

    let handle = server.handle();
    let signal_task = tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown signal error: {}", e),
        }
        let _ = shutdown_tx.send(true);
        handle.stop(true).await;
    });

    let result = server.await;
    signal_task.abort();

    match result {
        Ok(()) => {
            info!("Webhook shut down gracefully");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("HTTP server failed: {}", e)),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
