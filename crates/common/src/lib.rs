//! Framework Hub Common Library
//!
//! Shared records, storage and configuration for the Framework Hub
//! client, server and CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod normalize;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{HubConfig, SelectionMode, StorageKind};
pub use db::Database;
pub use error::{Error, Result};
pub use normalize::{normalize_build_log, normalize_generated_code};
pub use store::{KeyValueStore, LocalStore, MemoryKv, GENERATED_CODES, PIPELINES};
pub use types::*;

/// Framework Hub version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".fhub")
}

/// Default config file path
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
