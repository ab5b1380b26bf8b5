//! Persisting repaired or edited tab configuration.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::FileFormat;
use crate::error::{SourceError, SourceResult};
use crate::model::TabConfigs;

#[async_trait]
pub trait TabConfigWriter: Send + Sync {
    /// Replace the stored tab configuration with `tabs`.
    async fn write(&self, tabs: &TabConfigs) -> SourceResult<()>;
}

/// Writes tab config to a JSON or YAML file. The file is replaced
/// atomically: a temp file in the same directory is written, synced and
/// persisted over the target.
#[derive(Debug, Clone)]
pub struct FileTabConfigWriter {
    path: PathBuf,
}

impl FileTabConfigWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(&self, tabs: &TabConfigs) -> SourceResult<String> {
        let target = self.path.display().to_string();
        let write_err = |e: &dyn std::fmt::Display| SourceError::Write {
            target: target.clone(),
            message: e.to_string(),
        };
        match FileFormat::from_path(&self.path) {
            FileFormat::Json => serde_json::to_string_pretty(tabs)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| write_err(&e)),
            FileFormat::Yaml => serde_yaml::to_string(tabs).map_err(|e| write_err(&e)),
            FileFormat::Toml => Err(write_err(&"TOML cannot hold a top-level tab list")),
        }
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl TabConfigWriter for FileTabConfigWriter {
    async fn write(&self, tabs: &TabConfigs) -> SourceResult<()> {
        let body = self.render(tabs)?;
        let path = self.path.clone();
        let target = path.display().to_string();
        tokio::task::spawn_blocking(move || write_atomic(&path, body.as_bytes()))
            .await
            .map_err(|e| SourceError::Write {
                target: target.clone(),
                message: e.to_string(),
            })?
            .map_err(|e| SourceError::Write {
                target: target.clone(),
                message: e.to_string(),
            })?;
        tracing::info!("wrote {} tab(s) to {}", tabs.tabs.len(), target);
        Ok(())
    }
}
