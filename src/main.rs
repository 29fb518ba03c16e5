use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use kis_token_agent::cache::active_token::ActiveToken;
use kis_token_agent::config::credentials::Credentials;
use kis_token_agent::config::loader::load_config;
use kis_token_agent::helpers::time::SystemClock;
use kis_token_agent::issuer::TokenIssuer;
use kis_token_agent::manager::TokenManager;
use kis_token_agent::scheduler::{TokenScheduler, DEFAULT_CHECK_INTERVAL};
use kis_token_agent::server;
use kis_token_agent::store::file_store::CredentialStore;
use kis_token_agent::utils::logging::{self, LogLevel};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "kis-token-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config, initialize logging
    // -------------------------------

    let service_config = load_config(&args.config)?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Validate environment credentials (echoed masked)
    // -------------------------------

    let credentials = Credentials::from_env()?;

    // -------------------------------
    // 3. Open the credential store
    // -------------------------------

    let store = CredentialStore::open(&service_config.store.path)?;

    // -------------------------------
    // 4. Build issuer, active token holder and manager
    // -------------------------------

    let issuer = TokenIssuer::new(
        service_config.auth.token_url.clone(),
        Duration::from_millis(service_config.auth.request_timeout_ms),
    )?;
    let clock = Arc::new(SystemClock);
    let manager = Arc::new(TokenManager::new(
        store,
        issuer,
        ActiveToken::new(),
        credentials,
        clock.clone(),
    ));

    // -------------------------------
    // 5. Eager one-shot token check before the loop starts
    // -------------------------------

    match manager.startup_check().await {
        Some(_) => info!("initial token check succeeded"),
        None => {
            error!("initial token check failed, aborting startup");
            std::process::exit(1);
        }
    }

    // -------------------------------
    // 6. Start the renewal scheduler
    // -------------------------------

    let interval = service_config
        .settings
        .check_interval_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CHECK_INTERVAL);
    let scheduler = Arc::new(TokenScheduler::new(Arc::clone(&manager), clock));
    scheduler.start(interval).await;

    // -------------------------------
    // 7. Serve /metrics and /status until shutdown
    // -------------------------------

    info!("Service starting...");
    tokio::select! {
        res = server::server::start(&service_config.settings, Arc::clone(&scheduler)) => res?,
        _ = shutdown_signal() => {}
    }

    scheduler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(mut sigint), Ok(mut sigterm)) => {
            tokio::select! {
                _ = sigint.recv() => info!("Received SIGINT (Ctrl+C). Initiating graceful shutdown..."),
                _ = sigterm.recv() => info!("Received SIGTERM. Initiating graceful shutdown..."),
            }
        }
        _ => {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C. Initiating graceful shutdown...");
        }
    }
}
