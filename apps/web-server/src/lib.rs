//! # Yatube Web Server
//!
//! Actix-web surface of the blog: listings, posts, comments, follows,
//! authentication and group administration. Pages render as JSON contexts.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod page_cache;
pub mod state;
pub mod telemetry;

#[cfg(feature = "scheduler")]
pub mod background;

pub use config::AppConfig;
pub use handlers::configure_routes;
pub use state::AppState;
