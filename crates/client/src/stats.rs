//! Read-only aggregate counts

use fhub_common::{LocalStore, Result, StatsSnapshot};
use std::sync::Arc;

use crate::dual::{local_build_logs, local_generated_code, DualMode};
use crate::remote::RemoteApi;
use crate::selector::BackendSelector;

/// Stats from `GET /stats`, or recomputed from the local collections.
/// The server may bucket differently from the local scan.
#[derive(Clone)]
pub struct StatsClient {
    dual: DualMode,
}

impl StatsClient {
    pub fn new(selector: Arc<dyn BackendSelector>, remote: RemoteApi, local: LocalStore) -> Self {
        Self {
            dual: DualMode::new(selector, remote, local),
        }
    }

    pub async fn get(&self) -> Result<StatsSnapshot> {
        self.dual
            .run("get stats", self.dual.remote.stats(), |local| {
                let logs = local_build_logs(local);
                let code_total = local_generated_code(local).len();
                Ok(StatsSnapshot::from_records(&logs, code_total))
            })
            .await
    }
}
