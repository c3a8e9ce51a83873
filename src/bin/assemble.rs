//! Builds the client and the server and assembles them under `out/`.
//!
//! Usage: `assemble [PROJECT_ROOT]`, defaulting to the current directory.

use log::error;
use showcase_server::pipeline::BuildPlan;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let root = match env::args_os().nth(1) {
        Some(root) => PathBuf::from(root),
        None => match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("cannot determine project root: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    match BuildPlan::new(root).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Build process failed: {e}");
            ExitCode::FAILURE
        }
    }
}
