//! Environment-driven server configuration.

use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TYPST_BIN: &str = "typst";
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the donor API, without trailing slash (e.g. `https://host/api`).
    pub api_base_url: String,
    pub bind_address: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub upstream_timeout: Duration,
    pub typst_bin: String,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("DONOR_API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DONOR_API_BASE_URL"))?;

        let bind_address = lookup("BIND_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let cache_ttl_secs = parse_or("RECEIPT_CACHE_TTL_SECS", &lookup, DEFAULT_CACHE_TTL_SECS)?;
        let cache_capacity = parse_or("RECEIPT_CACHE_CAPACITY", &lookup, DEFAULT_CACHE_CAPACITY)?;
        let timeout_secs = parse_or(
            "UPSTREAM_TIMEOUT_SECS",
            &lookup,
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;

        let typst_bin = lookup("TYPST_BIN")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TYPST_BIN.to_string());

        let cors_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            _ => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            api_base_url,
            bind_address,
            port,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_capacity,
            upstream_timeout: Duration::from_secs(timeout_secs),
            typst_bin,
            cors_origins,
        })
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_base_url_set() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("DONOR_API_BASE_URL", "https://api.test/api/")]))
                .unwrap();

        assert_eq!(config.api_base_url, "https://api.test/api");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.typst_bin, "typst");
        assert!(!config.cors_origins.is_empty());
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        let result = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DONOR_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let result = ServerConfig::from_lookup(lookup_from(&[
            ("DONOR_API_BASE_URL", "https://api.test"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn test_cors_origins_are_split_and_trimmed() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DONOR_API_BASE_URL", "https://api.test"),
            ("CORS_ALLOWED_ORIGINS", "https://a.test, https://b.test,"),
        ]))
        .unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.test", "https://b.test"]);
    }
}
