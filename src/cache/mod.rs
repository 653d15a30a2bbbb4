//! Response cache for the table queries.
//!
//! Entries are keyed by [`CacheKey`], so a response is only ever reused for
//! the exact canonical parameters it was fetched with.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::query::{CacheKey, Resource};

/// Retry schedule for failed fetches.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(30_000),
        }
    }

    /// Delay before retry number `attempt` (0-based): `min(base * 2^attempt, cap)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

/// Cached responses of one resource type.
pub struct QueryCache<V> {
    entries: RwLock<HashMap<CacheKey, Entry<V>>>,
    stale_time: Duration,
    gc_time: Duration,
    retry: RetryPolicy,
}

impl<V: Clone + Send + Sync> QueryCache<V> {
    pub fn new(stale_time: Duration, gc_time: Duration, retry: RetryPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time,
            gc_time,
            retry,
        }
    }

    /// Fresh cached value for `key`, if any.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.fetched_at.elapsed() < self.stale_time)
            .map(|e| e.value.clone())
    }

    /// Cached value for `key`, or the result of `fetch` with retries.
    ///
    /// A successful result is stored under `key` only.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<V, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        self.purge_expired().await;

        if let Some(value) = self.get(key).await {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let value = self.fetch_with_retry(key, fetch).await?;

        self.entries.write().await.insert(
            key.clone(),
            Entry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(value)
    }

    async fn fetch_with_retry<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<V, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retry.retries => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        key = %key,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Fetch failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Drop entries fetched longer than the GC time ago.
    pub async fn purge_expired(&self) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.fetched_at.elapsed() < self.gc_time);

        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired cache entries");
        }
    }

    /// Drop the entry for `key`, so the next read fetches.
    pub async fn remove(&self, key: &CacheKey) {
        self.entries.write().await.remove(key);
    }

    /// Drop every entry of `resource`.
    pub async fn invalidate(&self, resource: Resource) {
        self.entries
            .write()
            .await
            .retain(|key, _| key.resource() != resource.as_str());
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
