//! Build log client

use fhub_common::{
    normalize_build_log, BuildLogFilter, BuildLogRecord, BuildLogUpdate, CreateResponse, Error,
    LocalStore, MessageResponse, NewBuildLog, Result, BUILD_LOG_DEFAULT_LIMIT, PIPELINES,
};
use std::sync::Arc;

use crate::dual::{local_build_logs, DualMode};
use crate::remote::RemoteApi;
use crate::selector::BackendSelector;

/// Build log CRUD over the remote API or the local `pipelines` collection
#[derive(Clone)]
pub struct BuildLogClient {
    dual: DualMode,
}

impl BuildLogClient {
    pub fn new(selector: Arc<dyn BackendSelector>, remote: RemoteApi, local: LocalStore) -> Self {
        Self {
            dual: DualMode::new(selector, remote, local),
        }
    }

    /// Record a build. Locally the id is the build_id, and duplicates are
    /// not detected.
    pub async fn create(&self, input: &NewBuildLog) -> Result<CreateResponse> {
        self.dual
            .run(
                "create build log",
                self.dual.remote.create_build_log(input),
                |local| {
                    let record = input.clone().into_record(input.build_id.clone());
                    local.insert_front(PIPELINES, serde_json::to_value(&record)?, None)?;
                    Ok(CreateResponse::offline(record.id, "Build log created successfully"))
                },
            )
            .await
    }

    /// List build logs. Local results keep insertion order, newest first.
    pub async fn get_all(&self, filter: &BuildLogFilter) -> Result<Vec<BuildLogRecord>> {
        self.dual
            .run(
                "list build logs",
                self.dual.remote.list_build_logs(filter),
                |local| Ok(filter.apply(local_build_logs(local), BUILD_LOG_DEFAULT_LIMIT)),
            )
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<BuildLogRecord> {
        self.dual
            .run("get build log", self.dual.remote.get_build_log(id), |local| {
                local_build_logs(local)
                    .into_iter()
                    .find(|r| r.id == id)
                    .ok_or_else(|| Error::not_found("build log", id))
            })
            .await
    }

    /// Merge `update` into a build log. Locally an unknown id is a no-op
    /// that still reports success.
    pub async fn update(&self, id: &str, update: &BuildLogUpdate) -> Result<MessageResponse> {
        self.dual
            .run(
                "update build log",
                self.dual.remote.update_build_log(id, update),
                |local| {
                    update_local(local, id, update)?;
                    Ok(MessageResponse::offline("Build log updated successfully"))
                },
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<MessageResponse> {
        self.dual
            .run("delete build log", self.dual.remote.delete_build_log(id), |local| {
                local.retain(PIPELINES, |raw| {
                    normalize_build_log(raw).map_or(true, |r| r.id != id)
                })?;
                Ok(MessageResponse::offline("Build log deleted successfully"))
            })
            .await
    }

    pub async fn clear_all(&self) -> Result<MessageResponse> {
        self.dual
            .run("clear build logs", self.dual.remote.clear_build_logs(), |local| {
                let count = local.clear(PIPELINES)?;
                Ok(MessageResponse::offline(&format!("Deleted {} build logs", count)))
            })
            .await
    }
}

/// Rewrite the first matching record in canonical form with `update`
/// applied. Records in other shapes are left byte-for-byte alone.
fn update_local(local: &LocalStore, id: &str, update: &BuildLogUpdate) -> Result<bool> {
    let mut records = local.read_all(PIPELINES);
    for raw in records.iter_mut() {
        let Ok(mut record) = normalize_build_log(raw) else {
            continue;
        };
        if record.id == id {
            record.apply(update);
            *raw = serde_json::to_value(&record)?;
            local.write_all(PIPELINES, &records)?;
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{FixedSelector, Mode};
    use chrono::{TimeZone, Utc};
    use fhub_common::{BuildStatus, MemoryKv, KeyValueStore};
    use serde_json::json;

    fn offline_client(local: LocalStore) -> BuildLogClient {
        BuildLogClient::new(
            Arc::new(FixedSelector(Mode::Local)),
            RemoteApi::new(reqwest::Client::new(), "http://127.0.0.1:9/api"),
            local,
        )
    }

    #[tokio::test]
    async fn test_legacy_records_are_normalized_and_updated() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(
            PIPELINES,
            &json!([
                {
                    "id": "FLT-3",
                    "build_id": "FLT-3",
                    "type": "Floating Framework",
                    "status": "running",
                    "startTime": "2024-02-01T10:00:00Z",
                    "jenkinsJob": "floating-framework-pipeline"
                },
                {"id": "junk"}
            ])
            .to_string(),
        )
        .unwrap();
        let client = offline_client(LocalStore::new(kv.clone()));

        let all = client.get_all(&BuildLogFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].jenkins_job, "floating-framework-pipeline");

        let end = Utc.with_ymd_and_hms(2024, 2, 1, 10, 30, 0).unwrap();
        let resp = client
            .update("FLT-3", &BuildLogUpdate::finished(BuildStatus::Completed, end))
            .await
            .unwrap();
        assert!(resp.is_offline());

        let record = client.get_by_id("FLT-3").await.unwrap();
        assert_eq!(record.status, BuildStatus::Completed);
        assert_eq!(record.end_time, Some(end));

        // The unreadable record is still stored untouched
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&kv.get(PIPELINES).unwrap().unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["jenkins_job"], "floating-framework-pipeline");
        assert_eq!(raw[1], json!({"id": "junk"}));
    }

    #[tokio::test]
    async fn test_update_unknown_id_reports_success() {
        let client = offline_client(LocalStore::in_memory());
        let resp = client
            .update("nope", &BuildLogUpdate::finished(BuildStatus::Failed, Utc::now()))
            .await
            .unwrap();
        assert_eq!(resp.message, "Build log updated successfully (offline mode)");
        assert!(client.get_all(&BuildLogFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_build_id_is_not_rejected_locally() {
        let client = offline_client(LocalStore::in_memory());
        let input = NewBuildLog::started("DUP-1", "OS Making", "os-making-pipeline");
        client.create(&input).await.unwrap();
        client.create(&input).await.unwrap();

        let all = client.get_all(&BuildLogFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.id == "DUP-1"));

        client.delete("DUP-1").await.unwrap();
        assert!(client.get_all(&BuildLogFilter::default()).await.unwrap().is_empty());
    }
}
