//! Application faults and the layer that turns every failed request into one JSON shape.

use crate::config::Mode;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::panic::Location;

/// Message sent instead of the real one for non-operational faults in production.
pub const GENERIC_MESSAGE: &str = "Something went very wrong!";

/// Upper bound when reading the body of an error response that has no `AppError` attached.
const MAX_COERCED_BODY: usize = 16 * 1024;

/// A request fault.
///
/// Operational faults are expected, client-attributable conditions whose message is safe to send
/// back verbatim. Everything else is non-operational and is reduced to [`GENERIC_MESSAGE`] in
/// production.
#[derive(Debug, Clone)]
pub struct AppError {
    message: String,
    status_code: StatusCode,
    is_operational: bool,
    location: &'static Location<'static>,
}

impl AppError {
    /// Creates a fault; 4xx statuses are operational, everything else is not.
    #[track_caller]
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        AppError {
            message: message.into(),
            status_code,
            is_operational: status_code.is_client_error(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn with_operational(mut self, is_operational: bool) -> Self {
        self.is_operational = is_operational;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// Where the fault was raised, formatted like a one-frame stack trace.
    pub fn stack(&self) -> String {
        format!("AppError: {}\n    at {}", self.message, self.location)
    }

    /// Renders the fault for the given deployment mode.
    pub fn render(&self, mode: Mode) -> Response {
        match mode {
            Mode::Development => (
                self.status_code,
                Json(json!({
                    "status": "error",
                    "error": {
                        "statusCode": self.status_code.as_u16(),
                        "isOperational": self.is_operational,
                        "message": self.message,
                    },
                    "message": self.message,
                    "stack": self.stack(),
                })),
            )
                .into_response(),
            Mode::Production if self.is_operational => (
                self.status_code,
                Json(json!({ "status": "error", "message": self.message })),
            )
                .into_response(),
            Mode::Production => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": GENERIC_MESSAGE })),
            )
                .into_response(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(fault) => fault,
            Err(err) => AppError::internal(format!("{err:#}")),
        }
    }
}

impl IntoResponse for AppError {
    /// Renders the production-safe shape and carries the fault itself to [`normalize_errors`].
    fn into_response(self) -> Response {
        let mut response = self.render(Mode::Production);
        response.extensions_mut().insert(self);
        response
    }
}

/// Outermost error stage: the single point deciding what a caller sees about a fault.
///
/// Responses carrying an [`AppError`] are re-rendered for the current mode. Other 4xx/5xx
/// responses (framework rejections, file server failures) are coerced into an `AppError` first.
pub async fn normalize_errors(State(mode): State<Mode>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let fault = match response.extensions().get::<AppError>() {
        Some(fault) => fault.clone(),
        None if is_failure(response.status()) => coerce(response).await,
        None => return response,
    };

    if mode == Mode::Production && !fault.is_operational() {
        error!("ERROR: {} {}", fault, fault.stack());
    }

    fault.render(mode)
}

/// Turns a handler panic into a non-operational fault.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };

    AppError::internal(format!("handler panicked: {detail}")).into_response()
}

fn is_failure(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

async fn coerce(response: Response) -> AppError {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), MAX_COERCED_BODY)
        .await
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&body).trim().to_owned();

    let message = if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_owned()
    } else {
        text
    };

    AppError::new(message, status)
}
