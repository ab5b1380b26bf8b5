//! Source readers feeding the directory.
//!
//! Every upstream (deployment registry, style store, topology descriptor,
//! tab config) is a `ConfigSource`. `TieredSource` chains fallbacks so a
//! failing or slow tier never surfaces as an error; `CachedSource` adds a
//! TTL in front of slow-changing config.

pub mod cache;
pub mod file;
pub mod writer;

pub use cache::CachedSource;
pub use file::{FileFormat, FileSource};
pub use writer::{FileTabConfigWriter, TabConfigWriter};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{SourceError, SourceResult};

/// One upstream of typed config.
///
/// `Ok(None)` means the source has nothing to offer (missing file, empty
/// tier); errors mean the fetch failed or the payload was malformed.
#[async_trait]
pub trait ConfigSource<T: Send>: Send + Sync {
    /// Short label used in logs and errors.
    fn name(&self) -> &str;

    async fn fetch(&self) -> SourceResult<Option<T>>;
}

/// Run `source.fetch()` under `timeout`, mapping expiry to
/// `SourceError::Timeout`.
pub async fn fetch_with_timeout<T: Send>(
    source: &dyn ConfigSource<T>,
    timeout: Duration,
) -> SourceResult<Option<T>> {
    match tokio::time::timeout(timeout, source.fetch()).await {
        Ok(res) => res,
        Err(_) => Err(SourceError::Timeout {
            name: source.name().to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// In-memory value, typically bundled defaults or test fixtures.
#[derive(Debug, Clone)]
pub struct StaticSource<T> {
    name: String,
    value: Option<T>,
}

impl<T> StaticSource<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }

    /// A source that never has a value.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> ConfigSource<T> for StaticSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> SourceResult<Option<T>> {
        Ok(self.value.clone())
    }
}

/// Ordered fallback chain: the first tier yielding a value wins.
///
/// Each tier runs under its own timeout. Errors, timeouts and absence are
/// logged and fall through; the chain itself only ever returns `Ok`.
pub struct TieredSource<T> {
    name: String,
    tiers: Vec<Arc<dyn ConfigSource<T>>>,
    tier_timeout: Duration,
}

impl<T: Send + 'static> TieredSource<T> {
    pub fn new(name: impl Into<String>, tier_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            tiers: Vec::new(),
            tier_timeout,
        }
    }

    /// Append a lower-priority tier.
    pub fn with_tier(mut self, tier: Arc<dyn ConfigSource<T>>) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[async_trait]
impl<T: Send + 'static> ConfigSource<T> for TieredSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> SourceResult<Option<T>> {
        for (i, tier) in self.tiers.iter().enumerate() {
            match fetch_with_timeout(tier.as_ref(), self.tier_timeout).await {
                Ok(Some(value)) => {
                    tracing::debug!("{}: using tier {} ({})", self.name, i, tier.name());
                    return Ok(Some(value));
                }
                Ok(None) => {
                    tracing::debug!("{}: tier {} ({}) empty", self.name, i, tier.name());
                }
                Err(e) => {
                    tracing::warn!("{}: tier {} failed, falling back: {}", self.name, i, e);
                }
            }
        }
        tracing::debug!("{}: no tier produced a value", self.name);
        Ok(None)
    }
}
