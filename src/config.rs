use std::net::SocketAddr;

use axum::http::HeaderValue;
use tower_cookies::Key;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process settings read from the environment (after `.env`, if present).
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cookie_key: Key,
    pub cors_origin: HeaderValue,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let cookie_key = match lookup("SECRET_KEY") {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| ConfigError::Invalid {
                name: "SECRET_KEY",
                reason: "must be at least 64 bytes".to_string(),
            })?,
            None => {
                tracing::warn!("SECRET_KEY not set; sessions will not survive a restart");
                Key::generate()
            }
        };

        let cors_origin = lookup("CORS_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .parse::<HeaderValue>()
            .map_err(|e| ConfigError::Invalid {
                name: "CORS_ORIGIN",
                reason: e.to_string(),
            })?;

        Ok(Self {
            database_url,
            bind_addr,
            cookie_key,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "sqlite::memory:")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.cors_origin, "http://localhost:3000");
    }

    #[test]
    fn database_url_is_required() {
        let err = AppConfig::from_lookup(lookup(&[])).err().unwrap();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn short_secret_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SECRET_KEY", "too-short"),
        ]))
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Invalid { name: "SECRET_KEY", .. }));
    }

    #[test]
    fn long_secret_accepted() {
        let secret = "k".repeat(64);
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SECRET_KEY", secret.as_str()),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
    }
}
