//! TTL cache in front of a slow-changing source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::ConfigSource;
use crate::error::SourceResult;

struct Entry<T> {
    value: Option<T>,
    fetched_at: Instant,
}

/// Caches the inner source's last successful answer (absence included) for
/// a fixed TTL. Expired entries are dropped lazily on the next read or by
/// `evict_expired`. Errors are never cached.
///
/// Concurrent misses are serialized, so the inner source is fetched at most
/// once per expiry.
pub struct CachedSource<T> {
    inner: Arc<dyn ConfigSource<T>>,
    ttl: Duration,
    slot: Mutex<Option<Entry<T>>>,
}

impl<T: Clone + Send + Sync + 'static> CachedSource<T> {
    pub fn new(inner: Arc<dyn ConfigSource<T>>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop the cached value; the next fetch goes to the inner source.
    pub async fn invalidate(&self) {
        if self.slot.lock().await.take().is_some() {
            tracing::debug!("{}: cache invalidated", self.inner.name());
        }
    }

    /// Drop the cached value if it has outlived the TTL. Returns whether
    /// anything was evicted.
    pub async fn evict_expired(&self) -> bool {
        let mut slot = self.slot.lock().await;
        let expired = slot
            .as_ref()
            .is_some_and(|e| e.fetched_at.elapsed() >= self.ttl);
        if expired {
            *slot = None;
            tracing::debug!("{}: evicted expired entry", self.inner.name());
        }
        expired
    }

    pub async fn is_cached(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ConfigSource<T> for CachedSource<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self) -> SourceResult<Option<T>> {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.value.clone());
            }
            tracing::debug!("{}: cache expired", self.inner.name());
        }
        *slot = None;
        let value = self.inner.fetch().await?;
        *slot = Some(Entry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }
}
