//! Best-effort Jenkins trigger
//!
//! Triggering is a side call made next to a build log create. It has no
//! local equivalent, so every failure comes back as a [`TriggerWarning`]
//! and the caller decides whether the run counts as degraded.

use fhub_common::{Error, JenkinsJobRequest, JenkinsJobResult};
use thiserror::Error;
use tracing::{info, warn};

use crate::remote::RemoteApi;

/// A job the server accepted
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerAck {
    pub build_id: String,
    pub message: String,
    pub job: Option<JenkinsJobResult>,
}

/// Why a trigger did not go through
#[derive(Error, Debug)]
pub enum TriggerWarning {
    #[error("Jenkins trigger skipped, API unreachable: {0}")]
    Unreachable(String),

    #[error("Jenkins trigger rejected: {0}")]
    Rejected(String),

    #[error("Jenkins trigger failed: {0}")]
    Failed(String),
}

#[derive(Clone)]
pub struct JenkinsClient {
    remote: RemoteApi,
}

impl JenkinsClient {
    pub fn new(remote: RemoteApi) -> Self {
        Self { remote }
    }

    pub async fn trigger(&self, request: &JenkinsJobRequest) -> Result<TriggerAck, TriggerWarning> {
        let response = match self.remote.trigger_jenkins(request).await {
            Ok(response) => response,
            Err(Error::NetworkUnavailable(e)) => {
                warn!("Jenkins trigger for {} not sent: {}", request.build_id, e);
                return Err(TriggerWarning::Unreachable(e));
            }
            Err(e) => {
                warn!("Jenkins trigger for {} failed: {}", request.build_id, e);
                return Err(TriggerWarning::Failed(e.to_string()));
            }
        };

        if !response.success {
            warn!("Jenkins trigger for {} rejected: {}", request.build_id, response.message);
            return Err(TriggerWarning::Rejected(response.message));
        }

        info!("Jenkins job triggered for {}", response.build_id);
        Ok(TriggerAck {
            build_id: response.build_id,
            message: response.message,
            job: response.jenkins_result,
        })
    }
}
