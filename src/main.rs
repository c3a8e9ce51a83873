//! Showcase API server
//!
//! Serves the `/api` endpoints and, in production, the prebuilt client application.
//!
//! (c) Showcase 2025

use anyhow::Context;
use log::{error, info};
use showcase_server::api::API_PREFIX;
use showcase_server::app;
use showcase_server::config::{Environment, Mode};
use showcase_server::infrastructure::database::Database;
use showcase_server::server::{Exit, Supervisor, shutdown_signal};
use std::env;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tokio::runtime::{Builder, Runtime};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        info!("no .env file loaded: {e}");
    }

    let environment = Environment::load().inspect_err(|e| error!("FATAL ERROR: {e}"))?;

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    let exit = runtime.block_on(serve(environment))?;

    // anything still running after the supervisor stopped is abandoned
    runtime.shutdown_background();

    Ok(exit.into())
}

fn init_tracing() {
    let default_filter = match Mode::parse(env::var("APP_ENV").ok().as_deref()) {
        Mode::Production => "info",
        Mode::Development => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

async fn serve(environment: Environment) -> anyhow::Result<Exit> {
    let database = Database::connect(environment.database_url.as_deref()).await;
    if !database.is_connected() {
        info!("Running without a database connection.");
    }

    let app = app::app(&environment);

    let listener = TcpListener::bind(("0.0.0.0", environment.port))
        .await
        .with_context(|| format!("failed to bind port {}", environment.port))?;

    info!(
        "Server running in {} mode on {}",
        environment.mode.as_str(),
        listener.local_addr()?
    );
    info!(
        "API available at http://localhost:{}{API_PREFIX}",
        environment.port
    );

    let exit = Supervisor::new()
        .run(listener, app, shutdown_signal())
        .await;

    // a forced stop may leave connections checked out, closing would wait on them
    if exit == Exit::Success {
        database.close().await;
    }

    Ok(exit)
}
