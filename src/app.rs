//! The layered request pipeline.
//!
//! Outermost first: cross-origin policy, request log, error normalizer, panic catcher, body
//! limit, then routing. Routing tries the `/api` router, then (production only) the client build
//! directory with its single-page fallback, and finally the not-found stage.

use crate::api::{self, API_PREFIX};
use crate::config::{Environment, Mode};
use crate::error::{self, AppError};
use axum::extract::{DefaultBodyLimit, State};
use axum::handler::Handler;
use axum::http::{Method, Uri};
use axum::response::Html;
use axum::{Router, middleware};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Request bodies above this size are rejected.
pub const BODY_LIMIT: usize = 10 * 1024;

/// Builds the complete application for the given configuration.
pub fn app(env: &Environment) -> Router {
    let router = Router::new().nest(API_PREFIX, api::router());

    let router = if env.is_production() {
        info!(
            "Production mode: Serving static files from {}",
            env.client_dir.display()
        );
        let entry = SpaEntry::new(&env.client_dir);
        router.fallback_service(
            ServeDir::new(&env.client_dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(spa_fallback.with_state(entry)),
        )
    } else {
        router.fallback(api::not_found)
    };

    with_pipeline(router, env)
}

/// Wraps `router` in every stage of the pipeline except routing itself.
pub fn with_pipeline(router: Router, env: &Environment) -> Router {
    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(middleware::from_fn_with_state(
            env.mode,
            error::normalize_errors,
        ))
        .layer(trace_layer(env.mode))
        .layer(cors_layer(env))
}

fn cors_layer(env: &Environment) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(env.cors_origins.clone()))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn trace_layer(mode: Mode) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    let (level, include_headers) = match mode {
        Mode::Production => (Level::INFO, false),
        Mode::Development => (Level::DEBUG, true),
    };

    TraceLayer::new_for_http()
        .make_span_with(
            DefaultMakeSpan::new()
                .level(level)
                .include_headers(include_headers),
        )
        .on_response(
            DefaultOnResponse::new()
                .level(level)
                .latency_unit(LatencyUnit::Millis),
        )
}

/// Location of the client's single-page entry document.
#[derive(Clone, Debug)]
struct SpaEntry(Arc<PathBuf>);

impl SpaEntry {
    fn new(client_dir: &Path) -> SpaEntry {
        SpaEntry(Arc::new(client_dir.join("index.html")))
    }
}

/// Whether a path should be answered with the entry document: not an API path, and the last
/// segment does not look like a file name.
pub fn wants_spa_entry(path: &str) -> bool {
    let looks_like_file = path
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'));

    !api::is_api_path(path) && !looks_like_file
}

async fn spa_fallback(
    State(entry): State<SpaEntry>,
    method: Method,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let readable = method == Method::GET || method == Method::HEAD;
    if !readable || !wants_spa_entry(uri.path()) {
        return Err(api::not_found_for(&uri));
    }

    tokio::fs::read_to_string(entry.0.as_path())
        .await
        .map(Html)
        .map_err(|e| {
            AppError::internal(format!(
                "failed to read entry document {}: {e}",
                entry.0.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spa_entry_paths() {
        assert!(wants_spa_entry("/"));
        assert!(wants_spa_entry("/settings/profile"));
        assert!(!wants_spa_entry("/assets/app.js"));
        assert!(!wants_spa_entry("/favicon.ico"));
        assert!(!wants_spa_entry("/api/v2/things"));
        assert!(!wants_spa_entry("/api"));
    }

    #[test]
    fn test_dot_only_counts_in_last_segment() {
        assert!(wants_spa_entry("/v1.2/release-notes"));
    }
}
