use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Settings for the upstream provider client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            connect_timeout_ms: 5_000,
            response_timeout_ms: 10_000,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Per-key quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub quota: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { quota: 5, window_secs: 3_600 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database holding cached records. In-memory only when absent.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8080".to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_keys = ["valid-key-1"]
///
/// [upstream]
/// base_url = "https://api.openweathermap.org/data/2.5/weather"
///
/// [rate_limit]
/// quota = 5
/// window_secs = 3600
///
/// [store]
/// path = "/var/lib/weather-proxy/records.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keys callers may present.
    pub api_keys: Vec<String>,
    pub upstream: UpstreamConfig,
    pub rate_limit: RateLimitConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load config from the platform location, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path, or return defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-proxy")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Add a key to the allow-list. Returns `false` if it was already present.
    pub fn add_api_key(&mut self, key: String) -> bool {
        if key.is_empty() || self.api_keys.contains(&key) {
            return false;
        }
        self.api_keys.push(key);
        true
    }

    pub fn allowed_keys(&self) -> &[String] {
        &self.api_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();

        assert!(cfg.api_keys.is_empty());
        assert_eq!(cfg.rate_limit.quota, 5);
        assert_eq!(cfg.rate_limit.window_secs, 3_600);
        assert_eq!(cfg.upstream.base_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(cfg.upstream.connect_timeout(), Duration::from_secs(5));
        assert!(cfg.store.path.is_none());
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_sections() {
        let cfg: Config = toml::from_str(
            r#"
            api_keys = ["valid-key-1", "valid-key-2"]

            [rate_limit]
            quota = 10
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.allowed_keys(), ["valid-key-1", "valid-key-2"]);
        assert_eq!(cfg.rate_limit.quota, 10);
        assert_eq!(cfg.rate_limit.window_secs, 3_600);
        assert_eq!(cfg.upstream, UpstreamConfig::default());
    }

    #[test]
    fn add_api_key_skips_duplicates_and_empty() {
        let mut cfg = Config::default();

        assert!(cfg.add_api_key("KEY".into()));
        assert!(!cfg.add_api_key("KEY".into()));
        assert!(!cfg.add_api_key(String::new()));
        assert_eq!(cfg.allowed_keys(), ["KEY"]);
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.add_api_key("valid-key-1".into());
        cfg.store.path = Some(dir.path().join("records.db"));
        cfg.upstream.base_url = "http://localhost:9999/weather".into();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_keys = 42").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
