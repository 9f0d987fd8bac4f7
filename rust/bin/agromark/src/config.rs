//! Client configuration.
//!
//! Reads/writes `~/.agromark/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use agromark_bff::RefreshPolicy;
use serde::{Deserialize, Serialize};

/// Server the mobile app shipped with.
pub const DEFAULT_SERVER: &str = "http://192.168.31.2:6933";

/// Environment variable overriding `server`.
pub const SERVER_ENV: &str = "AGROMARK_SERVER";

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the batch API (e.g. "http://localhost:6933").
    #[serde(default = "default_server")]
    pub server: String,

    /// Per-request timeout. Unset means the HTTP client's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// What a refresh does to an active search.
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            timeout_secs: None,
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Default config file path: ~/.agromark/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Server to talk to: command line, then `AGROMARK_SERVER`, then file.
    pub fn resolve_server(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| std::env::var(SERVER_ENV).ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| self.server.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Return the Agro Mark config directory (~/.agromark).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".agromark")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_shipped_server() {
        let config = ClientConfig::default();
        assert_eq!(config.server, DEFAULT_SERVER);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.refresh_policy, RefreshPolicy::Reset);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let config = ClientConfig {
            server: "http://localhost:6933".to_string(),
            timeout_secs: Some(5),
            refresh_policy: RefreshPolicy::Reapply,
        };

        config.save(&path).unwrap();
        let back = ClientConfig::load(&path).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: ClientConfig = toml::from_str("refresh_policy = \"reapply\"").unwrap();
        assert_eq!(config.server, DEFAULT_SERVER);
        assert_eq!(config.refresh_policy, RefreshPolicy::Reapply);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_policy = \"sometimes\"").unwrap();
        assert!(ClientConfig::load(&path).is_err());
    }

    #[test]
    fn command_line_server_wins() {
        let config = ClientConfig::default();
        assert_eq!(config.resolve_server(Some("http://cli:1")), "http://cli:1");
    }
}
