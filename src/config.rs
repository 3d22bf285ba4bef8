use std::time::Duration;

use crate::resolver::{ResolveOptions, MAX_GALLERY_SIZE};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("{name} must be at most {max}, got {value}")]
    TooLarge { name: &'static str, value: u64, max: u64 },
}

/// Image search provider credentials. Both halves are required.
#[derive(Debug, Clone)]
pub struct SearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub backend_url: String,
    pub search: Option<SearchCredentials>,
    pub resolve: ResolveOptions,
    pub insecure_ssl: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let search = match (non_empty("GOOGLE_API_KEY"), non_empty("SEARCH_ENGINE_ID")) {
            (Some(api_key), Some(engine_id)) => Some(SearchCredentials { api_key, engine_id }),
            _ => None,
        };

        let defaults = ResolveOptions::default();
        let resolve = ResolveOptions {
            max_results: parse_bounded(
                "CHARACTERKB_MAX_RESULTS",
                non_empty("CHARACTERKB_MAX_RESULTS"),
                defaults.max_results as u64,
                MAX_GALLERY_SIZE as u64,
            )? as usize,
            candidate_pool_size: parse_positive(
                "CHARACTERKB_CANDIDATE_POOL",
                non_empty("CHARACTERKB_CANDIDATE_POOL"),
                defaults.candidate_pool_size as u64,
            )? as usize,
            probe_timeout: Duration::from_millis(parse_positive(
                "CHARACTERKB_PROBE_TIMEOUT_MS",
                non_empty("CHARACTERKB_PROBE_TIMEOUT_MS"),
                defaults.probe_timeout.as_millis() as u64,
            )?),
        };

        Ok(Self {
            bind: non_empty("CHARACTERKB_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            backend_url: non_empty("CHARACTERKB_BACKEND_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            search,
            resolve,
            insecure_ssl: lookup("CHARACTERKB_INSECURE_SSL").as_deref() == Some("1"),
        })
    }
}

fn parse_bounded(
    name: &'static str,
    raw: Option<String>,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = parse_positive(name, raw, default)?;
    if value > max {
        return Err(ConfigError::TooLarge { name, value, max });
    }
    Ok(value)
}

fn parse_positive(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert!(config.search.is_none());
        assert_eq!(config.resolve.max_results, 4);
        assert_eq!(config.resolve.candidate_pool_size, 8);
        assert_eq!(config.resolve.probe_timeout, Duration::from_millis(5000));
        assert!(!config.insecure_ssl);
    }

    #[test]
    fn credentials_need_both_halves() {
        let config = config_from(&[("GOOGLE_API_KEY", "k")]).unwrap();
        assert!(config.search.is_none());

        let config = config_from(&[("GOOGLE_API_KEY", "k"), ("SEARCH_ENGINE_ID", "cx")]).unwrap();
        let creds = config.search.unwrap();
        assert_eq!(creds.api_key, "k");
        assert_eq!(creds.engine_id, "cx");
    }

    #[test]
    fn tunables_are_overridable() {
        let config = config_from(&[
            ("CHARACTERKB_MAX_RESULTS", "6"),
            ("CHARACTERKB_CANDIDATE_POOL", "10"),
            ("CHARACTERKB_PROBE_TIMEOUT_MS", "250"),
            ("CHARACTERKB_INSECURE_SSL", "1"),
        ])
        .unwrap();
        assert_eq!(config.resolve.max_results, 6);
        assert_eq!(config.resolve.candidate_pool_size, 10);
        assert_eq!(config.resolve.probe_timeout, Duration::from_millis(250));
        assert!(config.insecure_ssl);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = config_from(&[("CHARACTERKB_CANDIDATE_POOL", "zero")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "CHARACTERKB_CANDIDATE_POOL",
                value: "zero".to_string()
            }
        );
        assert!(config_from(&[("CHARACTERKB_MAX_RESULTS", "0")]).is_err());
    }

    #[test]
    fn gallery_size_is_capped_like_requests() {
        let config = config_from(&[("CHARACTERKB_MAX_RESULTS", "10")]).unwrap();
        assert_eq!(config.resolve.max_results, MAX_GALLERY_SIZE);

        let err = config_from(&[("CHARACTERKB_MAX_RESULTS", "500")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooLarge {
                name: "CHARACTERKB_MAX_RESULTS",
                value: 500,
                max: 10
            }
        );
    }

    #[test]
    fn long_probe_timeouts_are_accepted() {
        let config = config_from(&[("CHARACTERKB_PROBE_TIMEOUT_MS", "30000")]).unwrap();
        assert_eq!(config.resolve.probe_timeout, Duration::from_secs(30));
    }
}
