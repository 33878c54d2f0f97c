//! Runtime configuration read from the environment.

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;
use utils::jwt::TokenKeys;

const DEV_JWT_SECRET: &str = "farm-dev-secret-change-me";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub jwt_ttl_hours: i64,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://farm.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: SecretString::from(DEV_JWT_SECRET),
            jwt_ttl_hours: 24,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for
    /// unset or blank keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => defaults.port,
        };
        let jwt_ttl_hours = match get("JWT_TTL_HOURS") {
            Some(value) => match value.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => return Err(ConfigError::Invalid { key: "JWT_TTL_HOURS", value }),
            },
            None => defaults.jwt_ttl_hours,
        };
        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => SecretString::from(secret),
            None => {
                warn!("JWT_SECRET not set - using the development secret");
                defaults.jwt_secret
            }
        };
        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            host: get("HOST").unwrap_or(defaults.host),
            port,
            jwt_secret,
            jwt_ttl_hours,
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(self.jwt_secret.expose_secret(), Duration::hours(self.jwt_ttl_hours))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://farm.db");
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.jwt_ttl_hours, 24);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn reads_values_and_splits_origins() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("JWT_SECRET", "s3cret"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret.expose_secret(), "s3cret");
        assert_eq!(config.cors_allowed_origins, ["http://a.test", "http://b.test"]);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert_eq!(
            Config::from_lookup(lookup(&[("PORT", "http")])).unwrap_err(),
            ConfigError::Invalid {
                key: "PORT",
                value: "http".to_string()
            }
        );
        assert!(Config::from_lookup(lookup(&[("JWT_TTL_HOURS", "0")])).is_err());
    }
}
