//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use yatube_core::BlogService;
use yatube_core::ports::{Cache, PasswordService, TokenService, UserRepository};
use yatube_core::service::Repositories;
use yatube_infra::{Argon2PasswordService, InMemoryCache, InMemoryStore, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
use yatube_infra::{DatabaseConnections, postgres_repositories};

#[cfg(feature = "redis")]
use yatube_infra::{RedisCache, RedisConfig};

use crate::config::{AppConfig, CacheBackend};
use crate::page_cache::PageCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub page_cache: PageCache,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Set when pages are cached in process; the sweeper purges it.
    pub memory_cache: Option<Arc<InMemoryCache>>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let (cache, memory_cache) = build_cache(config.cache_backend).await;

        #[cfg(feature = "postgres")]
        let (db, repos) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = postgres_repositories(&connections.main);
                    (Some(Arc::new(connections)), repos)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                    (None, InMemoryStore::new().repositories())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, InMemoryStore::new().repositories())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            InMemoryStore::new().repositories()
        };

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        let mut state = Self::from_parts(repos, cache, config.page_cache_ttl, tokens);
        state.memory_cache = memory_cache;
        #[cfg(feature = "postgres")]
        {
            state.db = db;
        }

        tracing::info!(
            page_cache_secs = config.page_cache_ttl.as_secs(),
            "Application state initialized"
        );
        state
    }

    /// State over explicit repositories and cache.
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        page_cache_ttl: Duration,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            blog: BlogService::new(repos),
            page_cache: PageCache::new(cache, page_cache_ttl),
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            memory_cache: None,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    /// Fully in-memory state: storage, cache and a token service over `jwt`.
    pub fn in_memory(page_cache_ttl: Duration, jwt: JwtConfig) -> Self {
        let memory = Arc::new(InMemoryCache::new());
        let mut state = Self::from_parts(
            InMemoryStore::new().repositories(),
            memory.clone(),
            page_cache_ttl,
            Arc::new(JwtTokenService::new(jwt)),
        );
        state.memory_cache = Some(memory);
        state
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.blog.repositories().users
    }
}

async fn build_cache(backend: CacheBackend) -> (Arc<dyn Cache>, Option<Arc<InMemoryCache>>) {
    if backend == CacheBackend::Redis {
        if let Some(redis) = redis_cache().await {
            return (redis, None);
        }
    }

    let memory = Arc::new(InMemoryCache::new());
    (memory.clone(), Some(memory))
}

#[cfg(feature = "redis")]
async fn redis_cache() -> Option<Arc<dyn Cache>> {
    match RedisCache::new(RedisConfig::from_env()).await {
        Ok(redis) => Some(Arc::new(redis)),
        Err(e) => {
            tracing::error!(error = %e, "Redis unavailable. Caching pages in memory.");
            None
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn redis_cache() -> Option<Arc<dyn Cache>> {
    tracing::warn!("CACHE_BACKEND=redis ignored: built without the redis feature");
    None
}
