use crate::error::AppError;
use axum::Router;
use axum::http::Uri;

pub mod health;
pub mod v1;

/// Prefix every API route is mounted under.
pub const API_PREFIX: &str = "/api";

/// All API routes, relative to [`API_PREFIX`].
pub fn router() -> Router {
    Router::new().merge(health::router()).merge(v1::router())
}

/// Whether a request path belongs to the API, as opposed to the client application.
pub fn is_api_path(path: &str) -> bool {
    path == API_PREFIX
        || path
            .strip_prefix(API_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Terminal stage for requests nothing else answered.
pub async fn not_found(uri: Uri) -> AppError {
    not_found_for(&uri)
}

#[track_caller]
pub fn not_found_for(uri: &Uri) -> AppError {
    if is_api_path(uri.path()) {
        AppError::not_found(format!("API route not found: {uri}"))
    } else {
        AppError::not_found(format!("Resource not found: {uri}"))
    }
}
