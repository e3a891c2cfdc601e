use crate::cache::CacheConfig;
use curseforge_api::CurseForgeClient;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_url: String,
    pub history_url: String,
    /// Project pages live at `{project_base_url}/{id}`
    pub project_base_url: String,
    pub upstream_timeout: Duration,
    pub project_cache: CacheConfig,
    pub history_cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8888,
            api_url: CurseForgeClient::DEFAULT_API_URL.to_string(),
            history_url: CurseForgeClient::DEFAULT_HISTORY_URL.to_string(),
            project_base_url: "https://minecraft.curseforge.com/projects".to_string(),
            upstream_timeout: Duration::from_secs(30),
            project_cache: CacheConfig::new(
                Duration::from_secs(30 * 60),
                Duration::from_secs(60),
            ),
            history_cache: CacheConfig::new(
                Duration::from_secs(24 * 60 * 60),
                Duration::from_secs(30 * 60),
            ),
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    ///
    /// Missing or unparseable values keep their defaults. Durations must be
    /// at least one second.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
        };
        let secs = |key: &str, default: Duration| {
            parsed(key).map(Duration::from_secs).unwrap_or(default)
        };

        Self {
            port: parse_or(lookup("PORT"), defaults.port),
            api_url: lookup("CURSEFORGE_API_URL").unwrap_or(defaults.api_url),
            history_url: lookup("DOWNLOAD_HISTORY_URL").unwrap_or(defaults.history_url),
            project_base_url: lookup("PROJECT_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.project_base_url),
            upstream_timeout: secs("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout),
            project_cache: CacheConfig::new(
                secs("PROJECT_CACHE_TTL_SECS", defaults.project_cache.ttl),
                secs(
                    "PROJECT_CACHE_SWEEP_SECS",
                    defaults.project_cache.sweep_interval,
                ),
            ),
            history_cache: CacheConfig::new(
                secs("HISTORY_CACHE_TTL_SECS", defaults.history_cache.ttl),
                secs(
                    "HISTORY_CACHE_SWEEP_SECS",
                    defaults.history_cache.sweep_interval,
                ),
            ),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
