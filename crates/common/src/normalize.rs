//! Versioned parsing of records read back from the local store
//!
//! Build logs have been written under two naming conventions over time:
//!
//! - canonical: `start_time`, `end_time`, `jenkins_job`
//! - legacy: `startTime`, `endTime`, `jenkinsJob`
//!
//! Both are accepted and converted to [`BuildLogRecord`]. Anything else is
//! rejected with [`Error::MalformedRecord`] rather than defaulted.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{BuildLogRecord, BuildStatus, GeneratedCodeRecord};
use crate::{Error, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBuildLog {
    Canonical(CanonicalBuildLog),
    Legacy(LegacyBuildLog),
}

#[derive(Deserialize)]
struct CanonicalBuildLog {
    id: Option<String>,
    build_id: String,
    #[serde(rename = "type")]
    kind: String,
    status: BuildStatus,
    start_time: DateTime<Utc>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    command: Option<String>,
    jenkins_job: String,
    #[serde(default)]
    output_log: Option<String>,
}

#[derive(Deserialize)]
struct LegacyBuildLog {
    id: Option<String>,
    build_id: String,
    #[serde(rename = "type")]
    kind: String,
    status: BuildStatus,
    #[serde(rename = "startTime")]
    start_time: DateTime<Utc>,
    #[serde(rename = "endTime", default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    command: Option<String>,
    #[serde(rename = "jenkinsJob")]
    jenkins_job: String,
    #[serde(default)]
    output_log: Option<String>,
}

/// Parse a stored build log of either known shape into canonical form.
/// A missing `id` falls back to `build_id`, which is how local records are keyed.
pub fn normalize_build_log(raw: &Value) -> Result<BuildLogRecord> {
    let stored = StoredBuildLog::deserialize(raw)
        .map_err(|_| Error::MalformedRecord(describe("build log", raw)))?;

    let record = match stored {
        StoredBuildLog::Canonical(c) => BuildLogRecord {
            id: c.id.unwrap_or_else(|| c.build_id.clone()),
            build_id: c.build_id,
            kind: c.kind,
            status: c.status,
            start_time: c.start_time,
            end_time: c.end_time,
            config: c.config,
            command: c.command,
            jenkins_job: c.jenkins_job,
            output_log: c.output_log,
        },
        StoredBuildLog::Legacy(l) => BuildLogRecord {
            id: l.id.unwrap_or_else(|| l.build_id.clone()),
            build_id: l.build_id,
            kind: l.kind,
            status: l.status,
            start_time: l.start_time,
            end_time: l.end_time,
            config: l.config,
            command: l.command,
            jenkins_job: l.jenkins_job,
            output_log: l.output_log,
        },
    };

    Ok(record)
}

/// Parse a stored generated code record. There is only one shape.
pub fn normalize_generated_code(raw: &Value) -> Result<GeneratedCodeRecord> {
    GeneratedCodeRecord::deserialize(raw)
        .map_err(|e| Error::MalformedRecord(format!("{}: {}", describe("generated code", raw), e)))
}

fn describe(kind: &str, raw: &Value) -> String {
    match raw.get("id").and_then(Value::as_str) {
        Some(id) => format!("unrecognized {} shape (id {})", kind, id),
        None => format!("unrecognized {} shape", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_shape() {
        let raw = json!({
            "id": "JTAF-1",
            "build_id": "JTAF-1",
            "type": "JTAF Framework",
            "status": "running",
            "start_time": "2024-01-01T00:00:00Z",
            "config": {"browser": "chrome"},
            "jenkins_job": "jtaf-pipeline"
        });
        let record = normalize_build_log(&raw).unwrap();
        assert_eq!(record.id, "JTAF-1");
        assert_eq!(record.jenkins_job, "jtaf-pipeline");
        assert_eq!(record.start_time.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(record.end_time, None);
        assert_eq!(record.config["browser"], "chrome");
    }

    #[test]
    fn test_legacy_shape() {
        let raw = json!({
            "build_id": "OS-7",
            "type": "OS Making",
            "status": "completed",
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": "2024-01-01T00:10:00Z",
            "jenkinsJob": "os-making-pipeline",
            "output_log": "done"
        });
        let record = normalize_build_log(&raw).unwrap();
        assert_eq!(record.id, "OS-7");
        assert_eq!(record.status, BuildStatus::Completed);
        assert_eq!(record.jenkins_job, "os-making-pipeline");
        assert!(record.end_time.is_some());
        assert_eq!(record.output_log.as_deref(), Some("done"));
    }

    #[test]
    fn test_unrecognized_shape_is_rejected() {
        let missing_job = json!({
            "id": "X",
            "build_id": "X",
            "type": "JTAF Framework",
            "status": "running",
            "start_time": "2024-01-01T00:00:00Z"
        });
        assert!(matches!(
            normalize_build_log(&missing_job),
            Err(Error::MalformedRecord(msg)) if msg.contains("id X")
        ));

        let bad_status = json!({
            "build_id": "Y",
            "type": "JTAF Framework",
            "status": "exploded",
            "start_time": "2024-01-01T00:00:00Z",
            "jenkins_job": "j"
        });
        assert!(normalize_build_log(&bad_status).is_err());
        assert!(normalize_build_log(&json!("not an object")).is_err());
    }

    #[test]
    fn test_generated_code_shape() {
        let raw = json!({
            "id": "1700000000000000",
            "language": "rust",
            "type": "function",
            "code": "fn main() {}",
            "description": "entry point",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let record = normalize_generated_code(&raw).unwrap();
        assert_eq!(record.language, "rust");
        assert_eq!(record.kind, "function");

        assert!(normalize_generated_code(&json!({"id": "1"})).is_err());
    }
}
