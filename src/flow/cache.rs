// Time-bounded cache for flow simulation results

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::FlowResult;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct CacheEntry {
    result: Arc<FlowResult>,
    expires_at: Instant,
}

/// Shared result cache keyed by the simulation parameters. Reads take the
/// shared lock and never return an expired entry; concurrent writers for
/// the same key are last-writer-wins. A single periodic sweep evicts
/// expired entries instead of one detached timer per insertion.
pub struct FlowCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl FlowCache {
    pub fn new(ttl: Duration) -> Self {
        FlowCache {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<FlowResult>> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.result.clone())
            } else {
                None
            }
        })
    }

    pub async fn insert(&self, key: String, result: Arc<FlowResult>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                result,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Atomically replace the entire map.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        *entries = HashMap::new();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Evict expired entries; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Spawn the periodic eviction task. The task holds a weak handle and
    /// exits once the cache is dropped.
    pub fn start_sweep_task(&self, interval: Duration) {
        let entries = Arc::downgrade(&self.entries);

        tokio::spawn(async move {
            let mut sweep_interval = tokio::time::interval(interval);
            // The first tick fires immediately; skip it.
            sweep_interval.tick().await;

            loop {
                sweep_interval.tick().await;

                let Some(entries) = entries.upgrade() else {
                    break;
                };

                let mut entries = entries.write().await;
                let before = entries.len();
                let now = Instant::now();
                entries.retain(|_, entry| entry.expires_at > now);
                let evicted = before - entries.len();
                drop(entries);

                if evicted > 0 {
                    tracing::debug!("Evicted {} expired flow result(s)", evicted);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cached_result_is_shared_by_reference() {
        let cache = FlowCache::new(Duration::from_secs(60));
        let result = Arc::new(FlowResult::new());

        cache.insert("k1".to_string(), result.clone()).await;

        let first = cache.get("k1").await.unwrap();
        let second = cache.get("k1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &result));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_expired_entry_is_never_returned() {
        let cache = FlowCache::new(Duration::ZERO);
        cache
            .insert("k1".to_string(), Arc::new(FlowResult::new()))
            .await;

        assert!(cache.get("k1").await.is_none());
        assert_eq!(cache.len().await, 1);

        assert_eq!(cache.sweep_expired().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_replaces_map() {
        let cache = FlowCache::new(Duration::from_secs(60));
        cache
            .insert("k1".to_string(), Arc::new(FlowResult::new()))
            .await;
        cache
            .insert("k2".to_string(), Arc::new(FlowResult::new()))
            .await;

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert!(cache.get("k1").await.is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let cache = FlowCache::new(Duration::from_secs(60));
        let first = Arc::new(FlowResult::new());
        let second = Arc::new(FlowResult::new());

        cache.insert("k1".to_string(), first).await;
        cache.insert("k1".to_string(), second.clone()).await;

        assert!(Arc::ptr_eq(&cache.get("k1").await.unwrap(), &second));
    }
}
