use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};

/// Value returned from the cache, with whether it was served from memory
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub data: T,
    pub hit: bool,
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// In-memory TTL cache with single-flight misses
///
/// Concurrent callers that miss on the same key wait on one producer run
/// instead of each calling it. Failed producer runs are not cached.
///
/// This struct is cloneable; clones share entries and in-flight gates.
#[derive(Clone)]
pub struct TtlCache<T> {
    entries: Arc<RwLock<HashMap<String, Entry<T>>>>,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get a fresh value for `key`, or run `producer` and cache its result
    /// for `ttl`.
    pub async fn get_cached_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<Cached<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(data) = self.get(key).await {
            tracing::debug!(key, "Cache hit");
            return Ok(Cached { data, hit: true });
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key.to_string()).or_default().clone()
        };

        let result = {
            let _guard = gate.lock().await;

            // Another caller may have filled the entry while we waited
            if let Some(data) = self.get(key).await {
                tracing::debug!(key, "Cache filled by concurrent caller");
                Ok(Cached { data, hit: true })
            } else {
                tracing::debug!(key, "Cache miss, running producer");
                match producer().await {
                    Ok(data) => {
                        self.insert(key, data.clone(), ttl).await;
                        Ok(Cached { data, hit: false })
                    }
                    Err(e) => Err(e),
                }
            }
        };

        self.release_gate(key, &gate).await;

        result
    }

    /// Fresh value for `key`, if any
    async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    async fn insert(&self, key: &str, value: T, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drop the in-flight gate once nobody else holds it
    async fn release_gate(&self, key: &str, gate: &Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        // One reference in the map, one held by this caller
        if Arc::strong_count(gate) <= 2 {
            in_flight.remove(key);
        }
    }

    #[cfg(test)]
    async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache: TtlCache<u32> = TtlCache::new();
        let ttl = Duration::from_secs(60);

        let first = cache
            .get_cached_or_fetch("k", ttl, || async { Ok::<_, String>(7) })
            .await
            .unwrap();
        assert!(!first.hit);
        assert_eq!(first.data, 7);

        let second = cache
            .get_cached_or_fetch("k", ttl, || async { Ok::<_, String>(99) })
            .await
            .unwrap();
        assert!(second.hit);
        assert_eq!(second.data, 7);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let cache: TtlCache<u32> = TtlCache::new();

        cache
            .get_cached_or_fetch("k", Duration::ZERO, || async { Ok::<_, String>(1) })
            .await
            .unwrap();
        let again = cache
            .get_cached_or_fetch("k", Duration::ZERO, || async { Ok::<_, String>(2) })
            .await
            .unwrap();

        assert!(!again.hit);
        assert_eq!(again.data, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: TtlCache<u32> = TtlCache::new();
        let ttl = Duration::from_secs(60);

        let failed = cache
            .get_cached_or_fetch("k", ttl, || async { Err::<u32, _>("upstream down") })
            .await;
        assert!(failed.is_err());
        assert!(cache.get("k").await.is_none());

        let ok = cache
            .get_cached_or_fetch("k", ttl, || async { Ok::<_, &str>(3) })
            .await
            .unwrap();
        assert!(!ok.hit);
        assert_eq!(cache.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_run_producer_once() {
        let cache: TtlCache<u32> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let fetch = || {
            let calls = calls.clone();
            let cache = cache.clone();
            async move {
                cache
                    .get_cached_or_fetch("k", ttl, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, String>(42)
                    })
                    .await
            }
        };

        let (a, b, c, d) = tokio::join!(fetch(), fetch(), fetch(), fetch());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a, b, c, d] {
            assert_eq!(result.unwrap().data, 42);
        }
        assert_eq!(cache.in_flight_count().await, 0);
    }
}
