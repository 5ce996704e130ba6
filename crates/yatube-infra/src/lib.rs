//! # Yatube Infrastructure
//!
//! Concrete implementations of the ports defined in `yatube-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory repositories and cache only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `redis` - Redis-backed page cache

pub mod auth;
pub mod cache;
pub mod database;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConnections, postgres_repositories};

#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
