//! TOML configuration parsing and validation.
//!
//! All settings have built-in defaults, so the tool runs without a config
//! file against the well-known `civ_library` service. Operators override
//! the archive server address per deployment with `[library].host`, the
//! `CIV_LIBRARY_HOST` environment variable, or the `--host` CLI flag.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `[library].host`.
pub const HOST_ENV: &str = "CIV_LIBRARY_HOST";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    /// Base address of the archive server, e.g. `http://civ_library:8080`.
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
        }
    }
}

fn default_host() -> String {
    "http://civ_library:8080".to_string()
}

/// Per-endpoint request timeouts, in seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    #[serde(default = "default_catalog_secs")]
    pub catalog_secs: u64,
    #[serde(default = "default_search_secs")]
    pub search_secs: u64,
    #[serde(default = "default_fetch_secs")]
    pub fetch_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            catalog_secs: default_catalog_secs(),
            search_secs: default_search_secs(),
            fetch_secs: default_fetch_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn catalog(&self) -> Duration {
        Duration::from_secs(self.catalog_secs)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }
}

fn default_catalog_secs() -> u64 {
    2
}
fn default_search_secs() -> u64 {
    5
}
fn default_fetch_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Article text is cut to this many characters before formatting.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Context used when the caller does not supply one.
    #[serde(default = "default_context")]
    pub default_context: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            default_context: default_context(),
        }
    }
}

fn default_max_chars() -> usize {
    6000
}
fn default_context() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            library: LibraryConfig::default(),
            timeouts: TimeoutConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Apply the environment and CLI host overrides, CLI taking precedence.
    pub fn with_host_override(mut self, cli_host: Option<&str>) -> Self {
        if let Some(host) = cli_host {
            self.library.host = host.to_string();
        } else if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.trim().is_empty() {
                self.library.host = host;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let host = self.library.host.trim();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            anyhow::bail!(
                "library.host must start with http:// or https:// (got '{}')",
                self.library.host
            );
        }

        if self.timeouts.catalog_secs == 0
            || self.timeouts.search_secs == 0
            || self.timeouts.fetch_secs == 0
        {
            anyhow::bail!("timeouts must be > 0 seconds");
        }

        if self.retrieval.max_chars == 0 {
            anyhow::bail!("retrieval.max_chars must be > 0");
        }

        Ok(())
    }
}

/// Parse the config file at `path`.
///
/// Not validated: the host may still be overridden, so call
/// [`Config::validate`] once overrides are applied.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Load `path` when it exists, otherwise fall back to [`Config::minimal`].
///
/// `explicit` marks a path the operator passed on the command line; a
/// missing explicit path is an error rather than a silent fallback.
pub fn load_or_default(path: &Path, explicit: bool) -> Result<Config> {
    if path.exists() || explicit {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.library.host, "http://civ_library:8080");
        assert_eq!(cfg.timeouts.catalog(), Duration::from_secs(2));
        assert_eq!(cfg.timeouts.search(), Duration::from_secs(5));
        assert_eq!(cfg.timeouts.fetch(), Duration::from_secs(10));
        assert_eq!(cfg.retrieval.max_chars, 6000);
        assert_eq!(cfg.retrieval.default_context, "general");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let cfg = parse_config(
            r#"
[library]
host = "http://localhost:8080"

[timeouts]
fetch_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(cfg.library.host, "http://localhost:8080");
        assert_eq!(cfg.timeouts.fetch_secs, 30);
        assert_eq!(cfg.timeouts.search_secs, 5);
    }

    #[test]
    fn test_rejects_bad_host() {
        let mut cfg = Config::minimal();
        cfg.library.host = "civ_library:8080".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("library.host"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut cfg = Config::minimal();
        cfg.timeouts.search_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_max_chars() {
        let mut cfg = Config::minimal();
        cfg.retrieval.max_chars = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_cli_host_wins() {
        let cfg = Config::minimal().with_host_override(Some("http://10.0.0.5:8080"));
        assert_eq!(cfg.library.host, "http://10.0.0.5:8080");
    }

    #[test]
    fn test_missing_default_path_falls_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        let cfg = load_or_default(&path, false).unwrap();
        assert_eq!(cfg.library.host, "http://civ_library:8080");
        assert!(load_or_default(&path, true).is_err());
    }
}
