//! Duplicate detection over the article store.
//!
//! Two layers: a per-source fetch log (has this source already yielded
//! this link?) and global link uniqueness across both article tables.
//! Lookups fail open: a broken store check must never silently drop
//! fresh news, so errors are logged and the item is treated as new. The
//! unique constraints at insert time remain the hard backstop.

use crate::store::ArticleStore;
use crate::types::Result;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct Deduplicator {
    store: Arc<dyn ArticleStore>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    /// True when the link was already seen, either by this source's fetch
    /// log or anywhere in the article tables.
    pub async fn is_duplicate(&self, source_name: &str, link: &str) -> bool {
        match self.store.fetch_log_contains(source_name, link).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                warn!(source = source_name, link, error = %e, "Fetch-log lookup failed, treating item as new");
            }
        }

        match self.store.link_exists(link).await {
            Ok(found) => found,
            Err(e) => {
                warn!(link, error = %e, "Link lookup failed, treating item as new");
                false
            }
        }
    }

    /// Record the (source, link) pair. Idempotent; failures are logged
    /// and swallowed because the log is advisory.
    pub async fn remember(&self, source_name: &str, link: &str) {
        if let Err(e) = self.store.record_fetch(source_name, link).await {
            warn!(source = source_name, link, error = %e, "Failed to record fetch-log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn fetch_log_marks_links_as_seen() {
        let store = Arc::new(MemoryStore::new());
        let dedup = Deduplicator::new(store);

        assert!(!dedup.is_duplicate("TV9 Marathi", "https://example.com/a").await);
        dedup.remember("TV9 Marathi", "https://example.com/a").await;
        assert!(dedup.is_duplicate("TV9 Marathi", "https://example.com/a").await);
        // The fetch log is per source.
        assert!(!dedup.is_duplicate("Saam TV", "https://example.com/a").await);
    }
}
