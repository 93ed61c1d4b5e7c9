//! Backend selection strategies
//!
//! A resource client asks its selector which store to use before every
//! operation. The strategy decides how often the remote API is probed.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::health::HealthProber;

/// Store an operation runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Remote,
    Local,
}

/// Decides, per operation, whether the remote API or local store is used
#[async_trait]
pub trait BackendSelector: Send + Sync {
    async fn select(&self) -> Mode;
}

async fn probe_mode(prober: &HealthProber) -> Mode {
    if prober.probe().await {
        Mode::Remote
    } else {
        warn!("API unavailable, using local storage");
        Mode::Local
    }
}

/// Probes before every call. A session follows connectivity as it changes,
/// at the cost of one extra round trip per operation.
pub struct PerCallSelector {
    prober: HealthProber,
}

impl PerCallSelector {
    pub fn new(prober: HealthProber) -> Self {
        Self { prober }
    }
}

#[async_trait]
impl BackendSelector for PerCallSelector {
    async fn select(&self) -> Mode {
        probe_mode(&self.prober).await
    }
}

/// Probes on first use and keeps that answer for its lifetime
pub struct SessionSelector {
    prober: HealthProber,
    decided: OnceCell<Mode>,
}

impl SessionSelector {
    pub fn new(prober: HealthProber) -> Self {
        Self {
            prober,
            decided: OnceCell::new(),
        }
    }
}

#[async_trait]
impl BackendSelector for SessionSelector {
    async fn select(&self) -> Mode {
        *self
            .decided
            .get_or_init(|| async {
                let mode = probe_mode(&self.prober).await;
                info!("Session storage mode: {:?}", mode);
                mode
            })
            .await
    }
}

/// Always answers the same mode
pub struct FixedSelector(pub Mode);

#[async_trait]
impl BackendSelector for FixedSelector {
    async fn select(&self) -> Mode {
        self.0
    }
}
