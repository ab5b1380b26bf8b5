use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::Normalizer;

pub const DEFAULT_DEPLOYMENT_PREFIX: &str = "agentcore";
pub const DEFAULT_DEPLOYMENT_SUFFIX: &str = "dev";
/// Agent name that is never part of the directory and never a mention target.
pub const DEFAULT_EXCLUDED_AGENT: &str = "RoutingAgent";
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub sources: Option<SourcesCfg>,
    pub naming: Option<NamingCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SourcesCfg {
    pub deployed_file: Option<String>,
    pub style_files: Option<Vec<String>>,    // tier order: remote first, bundled last
    pub topology_files: Option<Vec<String>>,
    pub tab_files: Option<Vec<String>>,
    pub tab_write_file: Option<String>,
    pub fetch_timeout_ms: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NamingCfg {
    pub deployment_prefix: Option<String>,
    pub deployment_suffix: Option<String>,
    pub excluded_agents: Option<Vec<String>>,
    pub mention_sentinel: Option<String>,
}

pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)?;
    let cfg: UserConfig = toml::from_str(&s)?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Resolved settings consumed by the library.
#[derive(Debug, Clone)]
pub struct RosterSettings {
    pub normalizer: Normalizer,
    /// Agent types/names dropped during enrichment.
    pub excluded_agents: Vec<String>,
    /// Mention identifier that is never resolved.
    pub mention_sentinel: String,
    /// Per-source fetch timeout (each tier gets its own).
    pub fetch_timeout: Duration,
    /// Time-to-live for cached style and topology config.
    pub cache_ttl: Duration,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            normalizer: Normalizer::default(),
            excluded_agents: vec![DEFAULT_EXCLUDED_AGENT.to_string()],
            mention_sentinel: DEFAULT_EXCLUDED_AGENT.to_string(),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl RosterSettings {
    /// Apply the optional user config on top of the defaults.
    pub fn from_user_config(cfg: Option<&UserConfig>) -> Self {
        let mut out = Self::default();
        let Some(cfg) = cfg else {
            return out;
        };
        if let Some(naming) = cfg.naming.as_ref() {
            if let Some(p) = naming.deployment_prefix.as_ref() {
                out.normalizer.prefix = p.clone();
            }
            if let Some(s) = naming.deployment_suffix.as_ref() {
                out.normalizer.suffix = s.clone();
            }
            if let Some(ex) = naming.excluded_agents.as_ref() {
                out.excluded_agents = ex.clone();
            }
            if let Some(s) = naming.mention_sentinel.as_ref() {
                out.mention_sentinel = s.clone();
            }
        }
        if let Some(src) = cfg.sources.as_ref() {
            if let Some(ms) = src.fetch_timeout_ms {
                out.fetch_timeout = Duration::from_millis(ms);
            }
            if let Some(secs) = src.cache_ttl_secs {
                out.cache_ttl = Duration::from_secs(secs);
            }
        }
        out
    }
}
