//! Generated code client

use chrono::Utc;
use fhub_common::{
    normalize_generated_code, CreateResponse, Error, GeneratedCodeRecord, LocalStore,
    MessageResponse, NewGeneratedCode, PageFilter, Result, GENERATED_CODES, GENERATED_CODE_CAP,
    GENERATED_CODE_DEFAULT_LIMIT,
};
use std::sync::Arc;

use crate::dual::{local_generated_code, DualMode};
use crate::remote::RemoteApi;
use crate::selector::BackendSelector;

/// Generated code CRUD over the remote API or the local `generatedCodes`
/// collection, which keeps only the newest [`GENERATED_CODE_CAP`] records.
#[derive(Clone)]
pub struct GeneratedCodeClient {
    dual: DualMode,
}

impl GeneratedCodeClient {
    pub fn new(selector: Arc<dyn BackendSelector>, remote: RemoteApi, local: LocalStore) -> Self {
        Self {
            dual: DualMode::new(selector, remote, local),
        }
    }

    pub async fn create(&self, input: &NewGeneratedCode) -> Result<CreateResponse> {
        self.dual
            .run(
                "save generated code",
                self.dual.remote.create_generated_code(input),
                |local| {
                    let id = next_local_id(local);
                    let record = input.clone().into_record(id);
                    local.insert_front(
                        GENERATED_CODES,
                        serde_json::to_value(&record)?,
                        Some(GENERATED_CODE_CAP),
                    )?;
                    Ok(CreateResponse::offline(record.id, "Generated code saved successfully"))
                },
            )
            .await
    }

    pub async fn get_all(&self, page: &PageFilter) -> Result<Vec<GeneratedCodeRecord>> {
        self.dual
            .run(
                "list generated code",
                self.dual.remote.list_generated_code(page),
                |local| Ok(page.apply(local_generated_code(local), GENERATED_CODE_DEFAULT_LIMIT)),
            )
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<GeneratedCodeRecord> {
        self.dual
            .run("get generated code", self.dual.remote.get_generated_code(id), |local| {
                let raw = local
                    .find_by_id(GENERATED_CODES, id)
                    .ok_or_else(|| Error::not_found("generated code", id))?;
                // An unreadable record is as good as absent
                normalize_generated_code(&raw).map_err(|_| Error::not_found("generated code", id))
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<MessageResponse> {
        self.dual
            .run(
                "delete generated code",
                self.dual.remote.delete_generated_code(id),
                |local| {
                    local.remove_by_id(GENERATED_CODES, id)?;
                    Ok(MessageResponse::offline("Generated code deleted successfully"))
                },
            )
            .await
    }

    pub async fn clear_all(&self) -> Result<MessageResponse> {
        self.dual
            .run(
                "clear generated code",
                self.dual.remote.clear_generated_code(),
                |local| {
                    let count = local.clear(GENERATED_CODES)?;
                    Ok(MessageResponse::offline(&format!(
                        "Deleted {} generated code entries",
                        count
                    )))
                },
            )
            .await
    }
}

/// Microseconds since the epoch, bumped past the newest stored id so that
/// back-to-back creates never collide.
fn next_local_id(local: &LocalStore) -> String {
    let now = Utc::now().timestamp_micros();
    let newest = local
        .read_all(GENERATED_CODES)
        .first()
        .and_then(|r| r.get("id"))
        .and_then(|id| id.as_str())
        .and_then(|id| id.parse::<i64>().ok());

    match newest {
        Some(newest) if newest >= now => newest.saturating_add(1).to_string(),
        _ => now.to_string(),
    }
}
