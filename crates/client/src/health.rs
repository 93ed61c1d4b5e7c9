//! Remote API liveness probe

use std::time::Duration;
use tracing::debug;

/// Single-attempt liveness check against `{base}/health`
#[derive(Clone)]
pub struct HealthProber {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: format!("{}/health", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    /// True only on a 2xx answer. Never fails and never caches.
    pub async fn probe(&self) -> bool {
        match self.client.get(&self.url).timeout(self.timeout).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!("Health probe of {} returned {}", self.url, resp.status());
                false
            }
            Err(e) => {
                debug!("Health probe of {} failed: {}", self.url, e);
                false
            }
        }
    }
}
