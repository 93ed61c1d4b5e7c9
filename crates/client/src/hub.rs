//! Client composition root
//!
//! Builds one HTTP client, one selector and one local store, and shares
//! them across every resource client.

use fhub_common::config::ClientConfig;
use fhub_common::{Database, Error, LocalStore, Result, SelectionMode};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::build_logs::BuildLogClient;
use crate::generated_code::GeneratedCodeClient;
use crate::health::HealthProber;
use crate::jenkins::JenkinsClient;
use crate::remote::RemoteApi;
use crate::selector::{BackendSelector, FixedSelector, Mode, PerCallSelector, SessionSelector};
use crate::stats::StatsClient;

/// Every resource client over one shared selector and store
#[derive(Clone)]
pub struct Hub {
    pub build_logs: BuildLogClient,
    pub generated_code: GeneratedCodeClient,
    pub stats: StatsClient,
    pub jenkins: JenkinsClient,
    prober: HealthProber,
}

impl Hub {
    /// Open the on-disk local store named in `config` and wire the clients
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let db = Database::open(&config.store_path)?;
        Self::with_store(config, LocalStore::new(Arc::new(db)))
    }

    /// Wire the clients over a caller-supplied local store
    pub fn with_store(config: &ClientConfig, local: LocalStore) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {}", e)))?;

        let prober = HealthProber::new(
            client.clone(),
            &config.api_url,
            Duration::from_millis(config.probe_timeout_ms),
        );
        let selector: Arc<dyn BackendSelector> = match config.selection {
            SelectionMode::PerCall => Arc::new(PerCallSelector::new(prober.clone())),
            SelectionMode::PerSession => Arc::new(SessionSelector::new(prober.clone())),
            SelectionMode::Offline => Arc::new(FixedSelector(Mode::Local)),
        };

        info!(
            "Framework Hub client: api={} selection={}",
            config.api_url, config.selection
        );

        let remote = RemoteApi::new(client, &config.api_url);
        Ok(Self::with_parts(selector, prober, remote, local))
    }

    /// Wire the clients from already built parts
    pub fn with_parts(
        selector: Arc<dyn BackendSelector>,
        prober: HealthProber,
        remote: RemoteApi,
        local: LocalStore,
    ) -> Self {
        Self {
            build_logs: BuildLogClient::new(selector.clone(), remote.clone(), local.clone()),
            generated_code: GeneratedCodeClient::new(selector.clone(), remote.clone(), local.clone()),
            stats: StatsClient::new(selector, remote.clone(), local),
            jenkins: JenkinsClient::new(remote),
            prober,
        }
    }

    /// Probe the remote API right now, bypassing the selector
    pub async fn is_online(&self) -> bool {
        self.prober.probe().await
    }
}
