//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use yatube_infra::{DatabaseConfig, JwtConfig};

/// Default lifetime of a cached index page.
pub const DEFAULT_PAGE_CACHE_SECONDS: u64 = 20;

/// Where rendered pages are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl CacheBackend {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "redis" => Self::Redis,
            _ => Self::Memory,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the blog on in-memory repositories.
    pub database: Option<DatabaseConfig>,
    pub cache_backend: CacheBackend,
    pub page_cache_ttl: Duration,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            config.max_connections = parse_var("DB_MAX_CONNECTIONS").unwrap_or(100);
            config.min_connections = parse_var("DB_MIN_CONNECTIONS").unwrap_or(10);
            config
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            cache_backend: env::var("CACHE_BACKEND")
                .map(|v| CacheBackend::parse(&v))
                .unwrap_or(CacheBackend::Memory),
            page_cache_ttl: Duration::from_secs(
                parse_var("PAGE_CACHE_SECONDS").unwrap_or(DEFAULT_PAGE_CACHE_SECONDS),
            ),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_cache_backend_falls_back_to_memory() {
        assert_eq!(CacheBackend::parse("REDIS"), CacheBackend::Redis);
        assert_eq!(CacheBackend::parse("memcached"), CacheBackend::Memory);
    }
}
