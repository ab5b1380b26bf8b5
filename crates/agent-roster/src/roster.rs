//! Process-wide agent directory: one refresh path, lock-free readers.
//!
//! Readers `load()` an immutable, versioned `DirectorySnapshot`; `refresh`
//! fetches every upstream concurrently, runs enrichment and swaps in a
//! fully built snapshot. Concurrent refresh triggers are ticketed so the
//! last trigger wins and stale results are never stored.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};

use crate::config::{RosterSettings, SourcesCfg, expand_home};
use crate::consistency::{self, RepairOutcome, ValidationReport};
use crate::enrich::EnrichmentEngine;
use crate::error::{SourceError, SourceResult};
use crate::mention::{MentionParser, ParsedMessage};
use crate::model::{
    DeployedAgentRecord, Directory, EnrichedAgent, StyleConfig, TabConfigs, TopologyConfig,
};
use crate::resolve;
use crate::sources::{
    CachedSource, ConfigSource, FileSource, FileTabConfigWriter, StaticSource, TabConfigWriter,
    TieredSource, fetch_with_timeout,
};
use crate::suggest;

/// Upstreams the roster reads from.
pub struct RosterSources {
    pub deployed: Arc<dyn ConfigSource<Vec<DeployedAgentRecord>>>,
    pub style: Arc<dyn ConfigSource<StyleConfig>>,
    pub topology: Arc<dyn ConfigSource<TopologyConfig>>,
    pub tabs: Arc<dyn ConfigSource<TabConfigs>>,
    pub tab_writer: Option<Arc<dyn TabConfigWriter>>,
}

impl RosterSources {
    /// File-backed sources from the `[sources]` config section. Unset
    /// entries become empty sources.
    pub fn from_config(cfg: Option<&SourcesCfg>, settings: &RosterSettings) -> Self {
        let fallback = SourcesCfg::default();
        let cfg = cfg.unwrap_or(&fallback);
        type Records = Vec<DeployedAgentRecord>;
        let deployed: Arc<dyn ConfigSource<Records>> = match cfg.deployed_file.as_deref() {
            Some(p) => Arc::new(FileSource::<Records>::new(expand_home(p))),
            None => Arc::new(StaticSource::<Records>::empty("deployed")),
        };
        let tab_writer = cfg.tab_write_file.as_deref().map(|p| {
            Arc::new(FileTabConfigWriter::new(expand_home(p))) as Arc<dyn TabConfigWriter>
        });
        Self {
            deployed,
            style: file_tiers("style", cfg.style_files.as_deref(), settings.fetch_timeout),
            topology: file_tiers(
                "topology",
                cfg.topology_files.as_deref(),
                settings.fetch_timeout,
            ),
            tabs: file_tiers("tabs", cfg.tab_files.as_deref(), settings.fetch_timeout),
            tab_writer,
        }
    }
}

fn file_tiers<T: DeserializeOwned + Send + 'static>(
    name: &str,
    files: Option<&[String]>,
    timeout: Duration,
) -> Arc<dyn ConfigSource<T>> {
    let chain = files
        .unwrap_or_default()
        .iter()
        .fold(TieredSource::<T>::new(name, timeout), |chain, p| {
            chain.with_tier(Arc::new(FileSource::<T>::new(expand_home(p))))
        });
    tracing::debug!("{}: {} tier(s) configured", name, chain.len());
    Arc::new(chain)
}

/// One published directory state.
#[derive(Debug)]
pub struct DirectorySnapshot {
    /// Ticket of the refresh that built this snapshot; 0 before the first.
    pub version: u64,
    pub directory: Directory,
    /// Last good deployment list, reused when the registry is unreachable.
    deployed: Vec<DeployedAgentRecord>,
}

impl DirectorySnapshot {
    fn empty(directory: Directory) -> Self {
        Self {
            version: 0,
            directory,
            deployed: Vec::new(),
        }
    }

    pub fn deployed(&self) -> &[DeployedAgentRecord] {
        &self.deployed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Applied { version: u64, agents: usize },
    /// A newer trigger was already queued; nothing was done or stored.
    Superseded,
}

pub struct Roster {
    settings: RosterSettings,
    engine: EnrichmentEngine,
    parser: MentionParser,
    deployed: Arc<dyn ConfigSource<Vec<DeployedAgentRecord>>>,
    style: Arc<CachedSource<StyleConfig>>,
    topology: Arc<CachedSource<TopologyConfig>>,
    tab_source: Arc<dyn ConfigSource<TabConfigs>>,
    tab_writer: Option<Arc<dyn TabConfigWriter>>,
    snapshot: ArcSwap<DirectorySnapshot>,
    tabs: ArcSwap<TabConfigs>,
    tickets: AtomicU64,
    refresh_lock: Mutex<()>,
}

impl Roster {
    /// Build an empty roster; call `refresh` to populate it.
    pub fn new(settings: RosterSettings, sources: RosterSources) -> Self {
        let engine = EnrichmentEngine::from_settings(&settings);
        let parser = MentionParser::from_settings(&settings);
        let empty = Directory::new(settings.normalizer.clone());
        Self {
            style: Arc::new(CachedSource::new(sources.style, settings.cache_ttl)),
            topology: Arc::new(CachedSource::new(sources.topology, settings.cache_ttl)),
            deployed: sources.deployed,
            tab_source: sources.tabs,
            tab_writer: sources.tab_writer,
            snapshot: ArcSwap::from_pointee(DirectorySnapshot::empty(empty)),
            tabs: ArcSwap::from_pointee(TabConfigs::default()),
            tickets: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
            engine,
            parser,
            settings,
        }
    }

    pub fn settings(&self) -> &RosterSettings {
        &self.settings
    }

    /// Current snapshot; stays valid (and unchanged) while held.
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.snapshot.load_full()
    }

    /// Agents of the current snapshot, in directory order.
    pub fn directory(&self) -> Vec<EnrichedAgent> {
        self.snapshot.load().directory.as_slice().to_vec()
    }

    pub fn tab_configs(&self) -> Arc<TabConfigs> {
        self.tabs.load_full()
    }

    /// Re-fetch every source and publish a new snapshot.
    ///
    /// Deployment and tab fetches are bounded by the configured fetch
    /// timeout; style and topology go through their TTL caches and tier
    /// chains. A failed deployment fetch reuses the previous snapshot's list.
    pub async fn refresh(&self) -> RefreshOutcome {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = self.refresh_lock.lock().await;
        if self.tickets.load(Ordering::SeqCst) > ticket {
            tracing::debug!("refresh #{} superseded before start", ticket);
            return RefreshOutcome::Superseded;
        }

        let timeout = self.settings.fetch_timeout;
        let (deployed, style, topology, tabs) = tokio::join!(
            fetch_with_timeout(self.deployed.as_ref(), timeout),
            self.style.fetch(),
            self.topology.fetch(),
            fetch_with_timeout(self.tab_source.as_ref(), timeout),
        );

        let previous = self.snapshot.load_full();
        let deployed = match deployed {
            Ok(Some(list)) => list,
            Ok(None) => {
                tracing::warn!(
                    "deployment source returned nothing; keeping {} previous record(s)",
                    previous.deployed.len()
                );
                previous.deployed.clone()
            }
            Err(e) => {
                tracing::warn!(
                    "deployment fetch failed ({}); keeping {} previous record(s)",
                    e,
                    previous.deployed.len()
                );
                previous.deployed.clone()
            }
        };
        let style = absorb("style", style);
        let topology = absorb("topology", topology);
        let directory = self
            .engine
            .enrich(&deployed, style.as_ref(), topology.as_ref());

        if ticket <= previous.version {
            tracing::debug!("refresh #{} older than published #{}", ticket, previous.version);
            return RefreshOutcome::Superseded;
        }

        let agents = directory.len();
        self.snapshot.store(Arc::new(DirectorySnapshot {
            version: ticket,
            directory,
            deployed,
        }));
        match tabs {
            Ok(Some(tabs)) => self.tabs.store(Arc::new(tabs)),
            Ok(None) => {
                tracing::debug!("no tab config available; using empty default");
                self.tabs.store(Arc::new(TabConfigs::default()));
            }
            Err(e) => tracing::warn!("tab config fetch failed ({}); keeping previous", e),
        }
        tracing::info!("directory refreshed: version={} agents={}", ticket, agents);
        RefreshOutcome::Applied {
            version: ticket,
            agents,
        }
    }

    /// `refresh` bounded by `limit`. On expiry the pass is dropped and the
    /// published snapshot is left untouched.
    pub async fn refresh_with_timeout(&self, limit: Duration) -> Option<RefreshOutcome> {
        match tokio::time::timeout(limit, self.refresh()).await {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                tracing::warn!("refresh cancelled after {}ms", limit.as_millis());
                None
            }
        }
    }

    /// Lenient resolution: falls back to the first agent when nothing
    /// matches. Use `resolve_strict` when a miss must be visible.
    pub fn resolve(&self, identifier: &str) -> Option<EnrichedAgent> {
        resolve::resolve_lenient(&self.snapshot.load().directory, identifier)
    }

    pub fn resolve_strict(&self, identifier: &str) -> Option<EnrichedAgent> {
        resolve::resolve_strict(&self.snapshot.load().directory, identifier)
    }

    pub fn parse_mentions(&self, text: &str) -> ParsedMessage {
        self.parser.parse(&self.snapshot.load().directory, text)
    }

    pub fn suggest(&self, search: &str, limit: usize) -> Vec<EnrichedAgent> {
        suggest::suggest(&self.snapshot.load().directory, search, limit)
    }

    pub fn validate_consistency(&self) -> ValidationReport {
        consistency::validate(&self.snapshot.load().directory, &self.tabs.load())
    }

    /// Repair the in-memory tab config against the current directory.
    /// `save_tab_config` persists the result.
    ///
    /// The repair is re-run if a tab edit lands while it is computed, so
    /// concurrent edits are never overwritten.
    pub fn repair_consistency(&self) -> RepairOutcome {
        let snapshot = self.snapshot.load();
        let mut outcome = RepairOutcome::default();
        self.tabs.rcu(|current| {
            outcome = consistency::repair(&snapshot.directory, current);
            if outcome.is_noop() {
                Arc::clone(current)
            } else {
                Arc::new(outcome.repaired.clone())
            }
        });
        outcome
    }

    /// Write the current tab config through the configured writer.
    pub async fn save_tab_config(&self) -> SourceResult<()> {
        let Some(writer) = self.tab_writer.as_ref() else {
            return Err(SourceError::Write {
                target: "tabs".to_string(),
                message: "no tab config writer configured".to_string(),
            });
        };
        let tabs = self.tabs.load_full();
        writer.write(&tabs).await
    }

    /// Offer `key` on `tab_id`. Fails without mutating when the key is not
    /// in the directory, the tab is unknown, or the tab already lists it.
    pub fn add_agent_to_tab(&self, tab_id: &str, key: &str) -> bool {
        if !self.snapshot.load().directory.contains_key(key) {
            tracing::debug!("add to tab '{}': unknown agent '{}'", tab_id, key);
            return false;
        }
        self.update_tabs(|tabs| tabs.add_agent(tab_id, key))
    }

    /// Withdraw `key` from `tab_id`. Fails without mutating when the tab is
    /// unknown or does not list the key.
    pub fn remove_agent_from_tab(&self, tab_id: &str, key: &str) -> bool {
        self.update_tabs(|tabs| tabs.remove_agent(tab_id, key))
    }

    fn update_tabs(&self, mut edit: impl FnMut(&mut TabConfigs) -> bool) -> bool {
        let mut changed = false;
        self.tabs.rcu(|current| {
            let mut next = TabConfigs::clone(current);
            changed = edit(&mut next);
            if changed { Arc::new(next) } else { Arc::clone(current) }
        });
        changed
    }

    /// Drop cached style and topology so the next refresh re-fetches them.
    pub async fn invalidate_caches(&self) {
        self.style.invalidate().await;
        self.topology.invalidate().await;
    }

    /// Periodically evict expired cache entries. Send `true` on (or drop)
    /// the returned sender to stop.
    pub fn spawn_cache_sweeper(&self, every: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let style = Arc::clone(&self.style);
        let topology = Arc::clone(&self.topology);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(every) => {}
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("cache sweeper stopping");
                        return;
                    }
                }
                let style_evicted = style.evict_expired().await;
                let topology_evicted = topology.evict_expired().await;
                if style_evicted || topology_evicted {
                    tracing::debug!(
                        "cache sweep: style={} topology={}",
                        style_evicted,
                        topology_evicted
                    );
                }
            }
        });
        shutdown_tx
    }
}

fn absorb<T>(name: &str, res: SourceResult<Option<T>>) -> Option<T> {
    match res {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("{} unavailable, continuing without it: {}", name, e);
            None
        }
    }
}
