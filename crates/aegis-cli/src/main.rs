//! Command-line entry point for the Aegis sidecar.

use std::process::ExitCode;
use std::sync::Arc;

use aegis_core::AegisConfig;
use aegis_proxy::AppState;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aegis")]
#[command(about = "Aegis - security sidecar for LLM API traffic")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP sidecar.
    Start {
        /// Listen host, overrides AEGIS_HOST.
        #[arg(long)]
        host: Option<String>,
        /// Listen port, overrides AEGIS_PORT.
        #[arg(long)]
        port: Option<u16>,
        /// Reserved for a future file-based configuration layer.
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Validate configuration without starting the server.
    Check {
        /// Reserved for a future file-based configuration layer.
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print build and version information.
    Status,
}

fn init_tracing(config: &AegisConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(config_path: Option<&str>) -> AegisConfig {
    if let Some(path) = config_path {
        info!(path, "file-based configuration not yet implemented, falling back to environment");
    }
    AegisConfig::from_env()
}

async fn run_start(host: Option<String>, port: Option<u16>, config_path: Option<String>) -> anyhow::Result<ExitCode> {
    let mut config = load_config(config_path.as_deref());
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    init_tracing(&config);

    if let Err(reason) = config.validate() {
        error!(reason, "invalid configuration, refusing to start");
        return Ok(ExitCode::FAILURE);
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config));
    let app = aegis_proxy::build_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr, "failed to bind listener");
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(addr, "aegis listening");

    let interrupted = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let shutdown = shutdown_signal(interrupted.clone());

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!(error = %e, "server exited with error");
        return Ok(ExitCode::FAILURE);
    }

    if interrupted.load(std::sync::atomic::Ordering::SeqCst) {
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal(interrupted: Arc<std::sync::atomic::AtomicBool>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, draining in-flight requests"),
        _ = terminate => info!("received SIGTERM, draining in-flight requests"),
    }
    interrupted.store(true, std::sync::atomic::Ordering::SeqCst);
}

fn run_check(config_path: Option<String>) -> ExitCode {
    let config = load_config(config_path.as_deref());
    init_tracing(&config);

    match config.validate() {
        Ok(()) => {
            println!("configuration valid");
            println!("  host:              {}", config.host);
            println!("  port:              {}", config.port);
            println!("  upstream_url:      {}", config.upstream_url);
            println!("  guardrail_backend: {:?}", config.guardrail_backend);
            println!("  vault_db_path:     {}", config.vault_db_path);
            ExitCode::SUCCESS
        }
        Err(reason) => {
            eprintln!("configuration invalid: {reason}");
            ExitCode::FAILURE
        }
    }
}

fn run_status() -> ExitCode {
    println!("aegis {}", env!("CARGO_PKG_VERSION"));
    println!("  guardrail, shield, vault, proxy crates linked");
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Start { host, port, config }) => run_start(host, port, config).await,
        Some(Commands::Check { config }) => Ok(run_check(config)),
        Some(Commands::Status) | None => Ok(run_status()),
    }
}
