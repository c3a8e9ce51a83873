//! Optional pooled PostgreSQL connection

use log::{error, info, warn};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Database resource owned by the startup routine and handed to whatever needs it.
#[derive(Debug, Clone)]
pub enum Database {
    Connected(PgPool),
    /// No connection string was configured.
    Unconfigured,
    /// A connection string was configured but the first connection failed.
    Unavailable,
}

impl Database {
    /// Attempts a connection and verifies it with one acquire. Never fails startup.
    pub async fn connect(url: Option<&str>) -> Database {
        let Some(url) = url else {
            warn!("DATABASE_URL is not defined. Skipping database connection.");
            return Database::Unconfigured;
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await;

        match pool {
            Ok(pool) => {
                info!("PostgreSQL connected successfully.");
                Database::Connected(pool)
            }
            Err(e) => {
                error!("Error connecting to PostgreSQL database: {e}");
                Database::Unavailable
            }
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Database::Connected(pool) => Some(pool),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.pool().is_some()
    }

    pub async fn close(&self) {
        if let Database::Connected(pool) = self {
            pool.close().await;
            info!("Database pool closed.");
        }
    }
}
