//! File-backed sources. Format follows the extension: `.yaml`/`.yml`,
//! `.toml`, anything else is JSON.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::ConfigSource;
use crate::error::{SourceError, SourceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    /// Deserialize `text`; shape errors become `SourceError::Invalid`.
    pub fn parse<T: DeserializeOwned>(self, name: &str, text: &str) -> SourceResult<T> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|e| SourceError::invalid(name, e)),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| SourceError::invalid(name, e)),
            Self::Toml => toml::from_str(text).map_err(|e| SourceError::invalid(name, e)),
        }
    }
}

/// Typed config read from a file on every fetch. A missing file is absent,
/// not an error.
pub struct FileSource<T> {
    path: PathBuf,
    name: String,
    format: FileFormat,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FileSource<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        let format = FileFormat::from_path(&path);
        Self {
            path,
            name,
            format,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + 'static> ConfigSource<T> for FileSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> SourceResult<Option<T>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{}: not found", self.name);
                return Ok(None);
            }
            Err(e) => return Err(SourceError::unavailable(&self.name, e)),
        };
        self.format.parse(&self.name, &text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeployedAgentRecord, StyleConfig, TabConfigs};
    use std::io::Write;
    use tempfile::Builder;

    fn temp_with(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut f = Builder::new().suffix(suffix).tempfile().expect("tempfile");
        f.write_all(body.as_bytes()).expect("write");
        f
    }

    #[tokio::test]
    async fn reads_json_yaml_and_toml() {
        let json = temp_with(
            ".json",
            r#"[{"name":"agentcore-Bid-dev","agentType":"Bid","status":"active","id":"a1"}]"#,
        );
        let src: FileSource<Vec<DeployedAgentRecord>> = FileSource::new(json.path());
        let recs = src.fetch().await.expect("ok").expect("present");
        assert_eq!(recs[0].agent_type, "Bid");

        let yaml = temp_with(".yaml", "- id: plan\n  defaultAgent: Bid\n  availableAgents: [Bid]\n");
        let src: FileSource<TabConfigs> = FileSource::new(yaml.path());
        let tabs = src.fetch().await.expect("ok").expect("present");
        assert_eq!(tabs.get("plan").map(|t| t.default_agent.as_str()), Some("Bid"));

        let toml = temp_with(".toml", "[Bid]\ndisplayName = \"Bidder\"\n");
        let src: FileSource<StyleConfig> = FileSource::new(toml.path());
        let style = src.fetch().await.expect("ok").expect("present");
        assert_eq!(
            style.entry_for("Bid").and_then(|e| e.display_name.as_deref()),
            Some("Bidder")
        );
    }

    #[tokio::test]
    async fn missing_file_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src: FileSource<StyleConfig> = FileSource::new(dir.path().join("style.json"));
        assert!(src.fetch().await.expect("ok").is_none());
    }

    #[tokio::test]
    async fn malformed_payload_is_invalid() {
        let bad = temp_with(".json", r#"{"not":"a list"}"#);
        let src: FileSource<Vec<DeployedAgentRecord>> = FileSource::new(bad.path());
        let err = src.fetch().await.expect_err("invalid");
        assert!(matches!(err, SourceError::Invalid { .. }), "{err}");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.YML")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a/b.toml")), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("a/b")), FileFormat::Json);
    }
}
