use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use env_flags::env_flags;
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use agent_roster::config::{RosterSettings, UserConfig, expand_home, load_user_config};
use agent_roster::model::Directory;
use agent_roster::resolve::{ResolveMode, resolve_with_tier};
use agent_roster::{Roster, RosterSources};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

#[derive(Clone, Copy)]
enum LogStyle {
    Json,
    Compact,
    Pretty,
    Full,
}

fn fmt_layer<W>(style: LogStyle, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        LogStyle::Json => base.json().boxed(),
        LogStyle::Compact => base.compact().boxed(),
        LogStyle::Pretty => base.pretty().boxed(),
        LogStyle::Full => base.boxed(),
    }
}

/// `ROSTER_HOME`, else `$HOME/.agent-roster`, else `./.agent-roster`.
fn roster_home() -> PathBuf {
    env_flags! {
        /// Roster home directory (absolute). Defaults to $HOME/.agent-roster
        ROSTER_HOME: &str = "";
    }
    if !(*ROSTER_HOME).is_empty() {
        PathBuf::from((*ROSTER_HOME).to_string())
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".agent-roster")
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".agent-roster")
    }
}

fn init_tracing(home: &Path, user_cfg: Option<&UserConfig>) {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to file under <ROSTER_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = true;
        /// Optional explicit log directory (absolute). Defaults to <ROSTER_HOME>/logs
        LOG_DIR: &str = "";
    }

    use tracing_subscriber::prelude::*;

    let env_set = |k: &str| std::env::var_os(k).is_some();

    let mut rust_log = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else {
        (*RUST_LOG).to_string()
    };
    let mut json = *TRACING_JSON;
    let mut compact = *TRACING_COMPACT;
    let mut pretty = *TRACING_PRETTY;
    let mut to_file = *LOG_TO_FILE;
    let mut log_dir = (!(*LOG_DIR).is_empty()).then(|| PathBuf::from((*LOG_DIR).to_string()));

    // Env wins over config.
    if let Some(cfg) = user_cfg.and_then(|c| c.logging.as_ref()) {
        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(level) = cfg.level.as_ref()
        {
            rust_log = level.clone();
        }
        if !env_set("TRACING_JSON")
            && let Some(v) = cfg.json
        {
            json = v;
        }
        if !env_set("TRACING_COMPACT")
            && let Some(v) = cfg.compact
        {
            compact = v;
        }
        if !env_set("TRACING_PRETTY")
            && let Some(v) = cfg.pretty
        {
            pretty = v;
        }
        if !env_set("LOG_TO_FILE")
            && let Some(v) = cfg.to_file
        {
            to_file = v;
        }
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            log_dir = Some(expand_home(dir));
        }
    }

    let style = if json {
        LogStyle::Json
    } else if compact {
        LogStyle::Compact
    } else if pretty {
        LogStyle::Pretty
    } else {
        LogStyle::Full
    };
    let filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries results; logs go to stderr.
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(style, std::io::stderr, true)];

    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    let mut dir_error = None;
    if to_file {
        let dir = log_dir.unwrap_or_else(|| home.join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, "agent-roster.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(fmt_layer(style, nb, false));
            }
            Err(e) => dir_error = Some((dir, e)),
        }
    }

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
    {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = dir_error {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

/// Run `f` on every non-empty stdin line and print one JSON value per line.
fn for_each_line(mut f: impl FnMut(&str) -> anyhow::Result<serde_json::Value>) -> anyhow::Result<()> {
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        print_json(&f(line)?, false)?;
    }
    Ok(())
}

fn resolve_line(directory: &Directory, line: &str) -> anyhow::Result<serde_json::Value> {
    let hit = resolve_with_tier(directory, line, ResolveMode::Lenient);
    Ok(serde_json::json!({
        "input": line,
        "agent": hit.as_ref().map(|r| &r.agent),
        "tier": hit.as_ref().map(|r| r.tier),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let home = roster_home();
    let user_cfg = load_user_config(&home)
        .with_context(|| format!("reading {}", home.join("config.toml").display()))?;
    init_tracing(&home, user_cfg.as_ref());

    env_flags! {
        /// One of: validate, repair, directory, resolve, mentions, suggest
        ROSTER_MODE: &str = "validate";
        /// Write the repaired tab config back (repair mode)
        ROSTER_SAVE: bool = false;
        /// Max suggestions per query (suggest mode)
        ROSTER_SUGGEST_LIMIT: usize = 5;
        /// Upper bound on the initial refresh in milliseconds
        ROSTER_REFRESH_TIMEOUT_MS: u64 = 15000;
        /// Deployment list file; overrides [sources].deployed_file
        ROSTER_DEPLOYED_FILE: &str = "";
    }

    tracing::info!("starting agent-roster (mode={})", *ROSTER_MODE);
    tracing::info!("roster_home={}", home.display());

    let settings = RosterSettings::from_user_config(user_cfg.as_ref());
    let mut sources_cfg = user_cfg
        .and_then(|c| c.sources)
        .unwrap_or_default();
    if !(*ROSTER_DEPLOYED_FILE).is_empty() {
        sources_cfg.deployed_file = Some((*ROSTER_DEPLOYED_FILE).to_string());
    }
    let sources = RosterSources::from_config(Some(&sources_cfg), &settings);
    let roster = Roster::new(settings, sources);

    let limit = Duration::from_millis(*ROSTER_REFRESH_TIMEOUT_MS);
    match roster.refresh_with_timeout(limit).await {
        Some(outcome) => tracing::debug!("initial refresh: {:?}", outcome),
        None => tracing::warn!("initial refresh timed out; continuing with an empty directory"),
    }

    match *ROSTER_MODE {
        "validate" => print_json(&roster.validate_consistency(), true)?,
        "repair" => {
            let outcome = roster.repair_consistency();
            if *ROSTER_SAVE && !outcome.is_noop() {
                roster
                    .save_tab_config()
                    .await
                    .context("saving repaired tab config")?;
            }
            print_json(&outcome, true)?;
        }
        "directory" => print_json(&roster.directory(), true)?,
        "resolve" => {
            let snapshot = roster.snapshot();
            for_each_line(|line| resolve_line(&snapshot.directory, line))?;
        }
        "mentions" => for_each_line(|line| Ok(serde_json::to_value(roster.parse_mentions(line))?))?,
        "suggest" => {
            let n = *ROSTER_SUGGEST_LIMIT;
            for_each_line(|line| Ok(serde_json::to_value(roster.suggest(line, n))?))?;
        }
        other => anyhow::bail!(
            "unknown ROSTER_MODE '{}' (expected validate, repair, directory, resolve, mentions or suggest)",
            other
        ),
    }
    Ok(())
}
