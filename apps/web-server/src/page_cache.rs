//! Whole-page cache for the index listing.

use std::sync::Arc;
use std::time::Duration;

use yatube_core::ports::Cache;

const INDEX_PREFIX: &str = "page:index:";

/// Rendered index pages keyed by page number.
///
/// Callers cache only pages that exist, so the key space is bounded by the
/// number of index pages however many distinct `page` values clients send.
/// Cache failures never fail a request: reads miss and writes are dropped.
#[derive(Clone)]
pub struct PageCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn index_key(page: u64) -> String {
        format!("{INDEX_PREFIX}{page}")
    }

    pub async fn index(&self, page: u64) -> Option<String> {
        self.cache.get(&Self::index_key(page)).await
    }

    pub async fn store_index(&self, page: u64, body: &str) {
        let key = Self::index_key(page);
        if let Err(e) = self.cache.set(&key, body, Some(self.ttl)).await {
            tracing::warn!(key = %key, error = %e, "Failed to cache page");
        }
    }

    /// Drop every cached index page.
    pub async fn invalidate_index(&self) {
        match self.cache.delete_prefix(INDEX_PREFIX).await {
            Ok(removed) => tracing::debug!(removed, "Index page cache invalidated"),
            Err(e) => tracing::warn!(error = %e, "Failed to invalidate index page cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yatube_infra::InMemoryCache;

    fn page_cache(ttl: Duration) -> PageCache {
        PageCache::new(Arc::new(InMemoryCache::new()), ttl)
    }

    #[tokio::test]
    async fn pages_are_keyed_by_number() {
        let cache = page_cache(Duration::from_secs(20));
        cache.store_index(1, "first").await;
        cache.store_index(2, "second").await;

        assert_eq!(cache.index(1).await.as_deref(), Some("first"));
        assert_eq!(cache.index(2).await.as_deref(), Some("second"));
        assert_eq!(cache.index(3).await, None);
    }

    #[tokio::test]
    async fn invalidation_drops_all_index_pages() {
        let cache = page_cache(Duration::from_secs(20));
        cache.store_index(1, "first").await;
        cache.store_index(2, "second").await;

        cache.invalidate_index().await;

        assert_eq!(cache.index(1).await, None);
        assert_eq!(cache.index(2).await, None);
    }

    #[tokio::test]
    async fn pages_expire() {
        let cache = page_cache(Duration::from_millis(20));
        cache.store_index(1, "stale").await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.index(1).await, None);
    }
}
