//! Remote API client
//!
//! One method per resource and verb, each a single JSON request. A non-2xx
//! answer becomes [`Error::RequestFailed`] carrying only the operation name,
//! except a 404 on a by-id call, which becomes [`Error::NotFound`].

use fhub_common::{
    BuildLogFilter, BuildLogRecord, BuildLogUpdate, CreateResponse, Error, GeneratedCodeRecord,
    HealthStatus, JenkinsJobRequest, JenkinsTriggerResponse, MessageResponse, NewBuildLog,
    NewGeneratedCode, PageFilter, Result, StatsSnapshot,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the Framework Hub REST API
#[derive(Clone)]
pub struct RemoteApi {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteApi {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn item_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, urlencoding::encode(id))
    }

    /// Send a request and decode its JSON body. `missing` names the record
    /// a 404 refers to, for by-id operations.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
        missing: Option<(&str, &str)>,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::NetworkUnavailable(format!("{}: {}", operation, e)))?;

        let status = response.status();
        debug!("{} -> {}", operation, status);

        if status == StatusCode::NOT_FOUND {
            if let Some((kind, id)) = missing {
                return Err(Error::not_found(kind, id));
            }
        }
        if !status.is_success() {
            return Err(Error::request_failed(operation));
        }

        response
            .json::<T>()
            .await
            .map_err(|_| Error::request_failed(operation))
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus> {
        self.send("check health", self.client.get(self.url("/health")), None)
            .await
    }

    // Build logs

    pub async fn create_build_log(&self, input: &NewBuildLog) -> Result<CreateResponse> {
        let req = self.client.post(self.url("/build-logs")).json(input);
        self.send("create build log", req, None).await
    }

    pub async fn list_build_logs(&self, filter: &BuildLogFilter) -> Result<Vec<BuildLogRecord>> {
        let req = self.client.get(self.url("/build-logs")).query(filter);
        self.send("list build logs", req, None).await
    }

    pub async fn get_build_log(&self, build_id: &str) -> Result<BuildLogRecord> {
        let req = self.client.get(self.item_url("build-logs", build_id));
        self.send("get build log", req, Some(("build log", build_id)))
            .await
    }

    pub async fn update_build_log(
        &self,
        build_id: &str,
        update: &BuildLogUpdate,
    ) -> Result<MessageResponse> {
        let req = self
            .client
            .put(self.item_url("build-logs", build_id))
            .json(update);
        self.send("update build log", req, Some(("build log", build_id)))
            .await
    }

    pub async fn delete_build_log(&self, build_id: &str) -> Result<MessageResponse> {
        let req = self.client.delete(self.item_url("build-logs", build_id));
        self.send("delete build log", req, Some(("build log", build_id)))
            .await
    }

    pub async fn clear_build_logs(&self) -> Result<MessageResponse> {
        let req = self.client.delete(self.url("/build-logs"));
        self.send("clear build logs", req, None).await
    }

    // Generated code

    pub async fn create_generated_code(&self, input: &NewGeneratedCode) -> Result<CreateResponse> {
        let req = self.client.post(self.url("/generated-code")).json(input);
        self.send("save generated code", req, None).await
    }

    pub async fn list_generated_code(&self, page: &PageFilter) -> Result<Vec<GeneratedCodeRecord>> {
        let req = self.client.get(self.url("/generated-code")).query(page);
        self.send("list generated code", req, None).await
    }

    pub async fn get_generated_code(&self, id: &str) -> Result<GeneratedCodeRecord> {
        let req = self.client.get(self.item_url("generated-code", id));
        self.send("get generated code", req, Some(("generated code", id)))
            .await
    }

    pub async fn delete_generated_code(&self, id: &str) -> Result<MessageResponse> {
        let req = self.client.delete(self.item_url("generated-code", id));
        self.send("delete generated code", req, Some(("generated code", id)))
            .await
    }

    pub async fn clear_generated_code(&self) -> Result<MessageResponse> {
        let req = self.client.delete(self.url("/generated-code"));
        self.send("clear generated code", req, None).await
    }

    // Aggregates and side calls

    pub async fn stats(&self) -> Result<StatsSnapshot> {
        self.send("get stats", self.client.get(self.url("/stats")), None)
            .await
    }

    pub async fn trigger_jenkins(&self, request: &JenkinsJobRequest) -> Result<JenkinsTriggerResponse> {
        let req = self.client.post(self.url("/jenkins/trigger")).json(request);
        self.send("trigger jenkins job", req, None).await
    }
}
