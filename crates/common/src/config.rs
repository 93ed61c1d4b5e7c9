//! Framework Hub configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable selecting the remote API base URL
pub const API_URL_ENV: &str = "FHUB_API_URL";

/// Remote API base used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Client (dual-mode) configuration
    pub client: ClientConfig,

    /// Backend service configuration
    pub server: ServerConfig,
}

/// How the client decides between remote and local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Probe before every call
    PerCall,
    /// Probe once and keep the answer
    PerSession,
    /// Never contact the remote API
    Offline,
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self::PerCall
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::PerCall => write!(f, "per-call"),
            SelectionMode::PerSession => write!(f, "per-session"),
            SelectionMode::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for SelectionMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-call" => Ok(Self::PerCall),
            "per-session" => Ok(Self::PerSession),
            "offline" => Ok(Self::Offline),
            other => Err(format!("unknown selection mode: {}", other)),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote API base URL
    pub api_url: String,

    /// Health probe timeout
    pub probe_timeout_ms: u64,

    /// Timeout applied to every remote request
    pub request_timeout_ms: u64,

    /// Backend selection strategy
    pub selection: SelectionMode,

    /// Local fallback database
    pub store_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            probe_timeout_ms: 3000,
            request_timeout_ms: 15000,
            selection: SelectionMode::PerCall,
            store_path: crate::default_store_path().join("local.db"),
        }
    }
}

/// Server document storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Sqlite
    }
}

impl std::str::FromStr for StorageKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage kind: {}", other)),
        }
    }
}

/// Backend service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address
    pub listen: String,

    /// Document storage backend
    pub storage: StorageKind,

    /// SQLite database path
    pub db_path: PathBuf,

    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
            storage: StorageKind::Sqlite,
            db_path: crate::default_store_path().join("server.db"),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl HubConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from file, then apply `FHUB_*` environment overrides
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            self.client.api_url = url;
        }
        if let Some(selection) = lookup("FHUB_SELECTION") {
            self.client.selection = selection.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(path) = lookup("FHUB_STORE_PATH") {
            self.client.store_path = PathBuf::from(path);
        }
        if let Some(listen) = lookup("FHUB_LISTEN") {
            self.server.listen = listen;
        }
        if let Some(storage) = lookup("FHUB_STORAGE") {
            self.server.storage = storage.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(path) = lookup("FHUB_DB_PATH") {
            self.server.db_path = PathBuf::from(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HubConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, HubConfig::default());
        assert_eq!(config.client.api_url, DEFAULT_API_URL);
        assert_eq!(config.client.selection, SelectionMode::PerCall);
    }

    #[test]
    fn test_partial_file_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "[client]\nselection = \"per-session\"\n\n[server]\nstorage = \"memory\"\n",
        )
        .unwrap();

        let config = HubConfig::load(&path).unwrap();
        assert_eq!(config.client.selection, SelectionMode::PerSession);
        assert_eq!(config.client.api_url, DEFAULT_API_URL);
        assert_eq!(config.server.storage, StorageKind::Memory);
        assert_eq!(config.server.cors_origins.len(), 3);

        config.save(&path).unwrap();
        assert_eq!(HubConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FHUB_API_URL", "http://10.0.0.5:9000/api"),
            ("FHUB_SELECTION", "offline"),
            ("FHUB_STORAGE", "memory"),
        ]
        .into_iter()
        .collect();

        let mut config = HubConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.client.api_url, "http://10.0.0.5:9000/api");
        assert_eq!(config.client.selection, SelectionMode::Offline);
        assert_eq!(config.server.storage, StorageKind::Memory);

        let mut bad = HubConfig::default();
        assert!(bad
            .apply_env(|k| (k == "FHUB_SELECTION").then(|| "sometimes".to_string()))
            .is_err());
    }
}
