//! Binary entry point: parses the CLI, and absent a `users` subcommand,
//! loads configuration, opens the stores, wires `AppState`, spawns the
//! background reapers, and serves the router (spec §4.8, §4.9, §6).
//! Grounded on `ferrex-server/src/main.rs::main`'s gather-config →
//! init-tracing → build-state → spawn-background-tasks → serve shape.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use presenter_core::auth::AuthSecrets;
use presenter_core::config::{data_dir, EnvConfig};
use presenter_core::stores::Stores;
use presenter_server::cli::{Cli, Command};
use presenter_server::deck_stub::{PassthroughLyricsExtractor, PlaintextDeckBuilder};
use presenter_server::routes::build_router;
use presenter_server::state::{AppState, APP_ID};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Command::Users { action }) = cli.command {
        return presenter_server::cli::run_users_command(action);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("presenter-server: failed to start the async runtime: {err}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(serve()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("presenter-server: {err}");
            ExitCode::from(2)
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "presenter_server=info,presenter_core=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EnvConfig::gather();
    let data_dir = data_dir(APP_ID);

    info!("data directory: {}", data_dir.display());
    if !config.oauth_configured() {
        warn!("OAUTH_CLIENT_ID/OAUTH_CLIENT_SECRET not set — GET /auth/<provider> will return 503 until configured");
    }

    let stores = Stores::open(&data_dir)?;
    let secrets = AuthSecrets::load_or_create(&data_dir)?;

    let extractor = Arc::new(PassthroughLyricsExtractor);
    let deck_builder = Arc::new(PlaintextDeckBuilder);

    let state = AppState::new(config, data_dir, stores, secrets, extractor, deck_builder)?;

    spawn_background_tasks(&state);

    let host: std::net::IpAddr = state.config.web_host.parse().unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));
    let addr = SocketAddr::from((host, state.config.web_port));
    let app = build_router(state);

    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Session reaper, job GC, and viewer poller all run for the life of the
/// process; each catches and logs its own errors rather than propagating
/// (spec §7: "background tasks... never kill the worker").
fn spawn_background_tasks(state: &AppState) {
    let sessions = state.stores.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(presenter_core::stores::session_store::REAPER_INTERVAL);
        loop {
            ticker.tick().await;
            match sessions.reap_expired() {
                Ok(count) if count > 0 => info!("reaped {count} expired sessions"),
                Ok(_) => {}
                Err(err) => warn!("session reap failed: {err}"),
            }
        }
    });

    let jobs = state.jobs.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(presenter_core::jobs::JOB_GC_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = jobs.gc();
            if removed > 0 {
                info!("garbage-collected {removed} finished export jobs");
            }
        }
    });

    let viewer = state.viewer.clone();
    let client = state.client.clone();
    tokio::spawn(viewer.run_poll_loop(client));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
