//! Environment-derived configuration

use axum::http::HeaderValue;
use log::warn;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEV_CLIENT_ORIGIN: &str = "http://localhost:5173";

/// Deployment mode. Anything other than `production` runs as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn parse(value: Option<&str>) -> Mode {
        match value {
            Some(v) if v.eq_ignore_ascii_case("production") => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT value `{0}`")]
    InvalidPort(String),
    #[error("invalid CORS origin `{0}`")]
    InvalidOrigin(String),
    #[error("SESSION_SECRET is not defined in environment variables")]
    MissingSessionSecret,
}

#[derive(Debug, Clone)]
pub struct Environment {
    pub mode: Mode,
    pub port: u16,
    pub database_url: Option<String>,
    /// Origins allowed to make credentialed cross-origin requests. Empty means same-origin only.
    pub cors_origins: Vec<HeaderValue>,
    pub session_secret: Option<String>,
    /// Prebuilt client assets, only served in production.
    pub client_dir: PathBuf,
}

impl Environment {
    /// Reads the process environment. `.env` is loaded once by the binary before this runs.
    pub fn load() -> Result<Environment, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Environment, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = Mode::parse(var("APP_ENV").as_deref());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let cors_origins = match var("CORS_ORIGIN") {
            Some(raw) => parse_origins(&raw)?,
            None if mode == Mode::Development => vec![HeaderValue::from_static(DEV_CLIENT_ORIGIN)],
            None => Vec::new(),
        };

        let session_secret = var("SESSION_SECRET");
        if session_secret.is_none() {
            if mode == Mode::Production {
                return Err(ConfigError::MissingSessionSecret);
            }
            warn!("SESSION_SECRET is not set, fine outside production");
        }

        let client_dir = var("CLIENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_client_dir);

        Ok(Environment {
            mode,
            port,
            database_url: var("DATABASE_URL"),
            cors_origins,
            session_secret,
            client_dir,
        })
    }

    /// Development defaults, with no external variables consulted.
    pub fn development() -> Environment {
        Environment {
            mode: Mode::Development,
            port: DEFAULT_PORT,
            database_url: None,
            cors_origins: vec![HeaderValue::from_static(DEV_CLIENT_ORIGIN)],
            session_secret: None,
            client_dir: PathBuf::from("client"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.to_owned()))
        })
        .collect()
}

/// `../client` next to the directory holding the server executable, as laid out by `assemble`.
fn default_client_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("..").join("client")))
        .unwrap_or_else(|| PathBuf::from("client"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_development() {
        let env = Environment::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env.mode, Mode::Development);
        assert_eq!(env.port, 3000);
        assert!(env.database_url.is_none());
        assert_eq!(env.cors_origins, vec![HeaderValue::from_static(DEV_CLIENT_ORIGIN)]);
    }

    #[test]
    fn test_production_requires_session_secret() {
        let result = Environment::from_lookup(lookup(&[("APP_ENV", "production")]));
        assert!(matches!(result, Err(ConfigError::MissingSessionSecret)));
    }

    #[test]
    fn test_production_with_secret_has_no_default_origin() {
        let env = Environment::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("SESSION_SECRET", "s3cret"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert!(env.is_production());
        assert_eq!(env.port, 8080);
        assert!(env.cors_origins.is_empty());
    }

    #[test]
    fn test_origin_list_is_split_and_trimmed() {
        let env = Environment::from_lookup(lookup(&[(
            "CORS_ORIGIN",
            "https://a.example, https://b.example,",
        )]))
        .unwrap();
        assert_eq!(env.cors_origins.len(), 2);
        assert_eq!(env.cors_origins[1], "https://b.example");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Environment::from_lookup(lookup(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidPort(p)) if p == "eighty"));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let env = Environment::from_lookup(lookup(&[("PORT", ""), ("DATABASE_URL", " ")])).unwrap();
        assert_eq!(env.port, 3000);
        assert!(env.database_url.is_none());
    }

    #[test]
    fn test_unknown_mode_falls_back_to_development() {
        assert_eq!(Mode::parse(Some("staging")), Mode::Development);
        assert_eq!(Mode::parse(Some("PRODUCTION")), Mode::Production);
        assert_eq!(Mode::parse(None), Mode::Development);
    }
}
