//! Shared remote-or-local dispatch for the resource clients

use fhub_common::{
    normalize_build_log, normalize_generated_code, BuildLogRecord, GeneratedCodeRecord,
    LocalStore, Result, GENERATED_CODES, PIPELINES,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::remote::RemoteApi;
use crate::selector::{BackendSelector, Mode};

/// The selector, remote API and local store one resource client works over
#[derive(Clone)]
pub(crate) struct DualMode {
    selector: Arc<dyn BackendSelector>,
    pub(crate) remote: RemoteApi,
    pub(crate) local: LocalStore,
}

impl DualMode {
    pub(crate) fn new(selector: Arc<dyn BackendSelector>, remote: RemoteApi, local: LocalStore) -> Self {
        Self {
            selector,
            remote,
            local,
        }
    }

    /// Run `remote` when the selector picks the remote API, otherwise
    /// `local`. A remote call that cannot reach the server also falls back
    /// to `local`; every other remote result is returned as is.
    ///
    /// `remote` is lazy and is dropped unpolled in local mode.
    pub(crate) async fn run<T, R, L>(&self, operation: &str, remote: R, local: L) -> Result<T>
    where
        R: Future<Output = Result<T>>,
        L: FnOnce(&LocalStore) -> Result<T>,
    {
        match self.selector.select().await {
            Mode::Local => {
                debug!("{}: local storage", operation);
                local(&self.local)
            }
            Mode::Remote => match remote.await {
                Err(e) if e.is_unavailable() => {
                    warn!("{} could not reach the API, using local storage: {}", operation, e);
                    local(&self.local)
                }
                other => other,
            },
        }
    }
}

/// Every readable local build log, canonicalized, in stored order.
/// Records that match no known shape are skipped.
pub(crate) fn local_build_logs(local: &LocalStore) -> Vec<BuildLogRecord> {
    local
        .read_all(PIPELINES)
        .iter()
        .filter_map(|raw| match normalize_build_log(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping local build log: {}", e);
                None
            }
        })
        .collect()
}

/// Every readable local generated code record, in stored order
pub(crate) fn local_generated_code(local: &LocalStore) -> Vec<GeneratedCodeRecord> {
    local
        .read_all(GENERATED_CODES)
        .iter()
        .filter_map(|raw| match normalize_generated_code(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping local generated code: {}", e);
                None
            }
        })
        .collect()
}
