//! Liveness probe

use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
}

impl Health {
    pub fn up(now: DateTime<Utc>) -> Health {
        Health {
            status: "UP",
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

async fn health() -> Json<Health> {
    Json(Health::up(Utc::now()))
}
