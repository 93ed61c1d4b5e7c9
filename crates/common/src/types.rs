//! Core types for Framework Hub

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most generated-code records the local store keeps
pub const GENERATED_CODE_CAP: usize = 10;

/// Default page size for build log listings
pub const BUILD_LOG_DEFAULT_LIMIT: usize = 100;

/// Default page size for generated code listings
pub const GENERATED_CODE_DEFAULT_LIMIT: usize = 10;

/// Build type labels that get their own stats bucket
pub const JTAF_FRAMEWORK: &str = "JTAF Framework";
pub const FLOATING_FRAMEWORK: &str = "Floating Framework";
pub const OS_MAKING: &str = "OS Making";

/// Build status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Running,
    Completed,
    Failed,
}

impl Default for BuildStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Running => write!(f, "running"),
            BuildStatus::Completed => write!(f, "completed"),
            BuildStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for BuildStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown build status: {}", other)),
        }
    }
}

// ============================================================================
// Build logs
// ============================================================================

/// Input for creating a build log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBuildLog {
    pub build_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: BuildStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub jenkins_job: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_log: Option<String>,
}

impl NewBuildLog {
    /// A freshly started build with an empty config
    pub fn started(
        build_id: impl Into<String>,
        kind: impl Into<String>,
        jenkins_job: impl Into<String>,
    ) -> Self {
        Self {
            build_id: build_id.into(),
            kind: kind.into(),
            status: BuildStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            config: serde_json::json!({}),
            command: None,
            jenkins_job: jenkins_job.into(),
            output_log: None,
        }
    }

    pub fn into_record(self, id: String) -> BuildLogRecord {
        BuildLogRecord {
            id,
            build_id: self.build_id,
            kind: self.kind,
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            config: self.config,
            command: self.command,
            jenkins_job: self.jenkins_job,
            output_log: self.output_log,
        }
    }
}

/// A stored build log in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildLogRecord {
    pub id: String,
    pub build_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: BuildStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub jenkins_job: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_log: Option<String>,
}

impl BuildLogRecord {
    /// Merge the fields present in `update`, leaving the rest untouched
    pub fn apply(&mut self, update: &BuildLogUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(end_time) = update.end_time {
            self.end_time = Some(end_time);
        }
        if let Some(output_log) = &update.output_log {
            self.output_log = Some(output_log.clone());
        }
    }
}

/// Partial update for a build log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildLogUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_log: Option<String>,
}

impl BuildLogUpdate {
    /// Final transition of a build: status plus end time
    pub fn finished(status: BuildStatus, end_time: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            end_time: Some(end_time),
            output_log: None,
        }
    }

    pub fn with_output_log(mut self, output_log: impl Into<String>) -> Self {
        self.output_log = Some(output_log.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.end_time.is_none() && self.output_log.is_none()
    }
}

/// Query filter for build log listings. Absent fields are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildLogFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildStatus>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl BuildLogFilter {
    pub fn matches(&self, record: &BuildLogRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self.kind.as_deref().map_or(true, |k| record.kind == k)
    }

    /// Filter an already ordered sequence, then apply skip and limit
    pub fn apply(&self, records: Vec<BuildLogRecord>, default_limit: usize) -> Vec<BuildLogRecord> {
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(default_limit))
            .collect()
    }
}

// ============================================================================
// Generated code
// ============================================================================

/// Input for saving a generated code snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGeneratedCode {
    pub language: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub description: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl NewGeneratedCode {
    pub fn new(
        language: impl Into<String>,
        kind: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            kind: kind.into(),
            code: code.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn into_record(self, id: String) -> GeneratedCodeRecord {
        GeneratedCodeRecord {
            id,
            language: self.language,
            kind: self.kind,
            code: self.code,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

/// A stored generated code snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCodeRecord {
    pub id: String,
    pub language: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Skip/limit paging for generated code listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl PageFilter {
    pub fn limit(limit: usize) -> Self {
        Self {
            skip: None,
            limit: Some(limit),
        }
    }

    pub fn apply<T>(&self, records: Vec<T>, default_limit: usize) -> Vec<T> {
        records
            .into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(default_limit))
            .collect()
    }
}

// ============================================================================
// Responses
// ============================================================================

const OFFLINE_SUFFIX: &str = " (offline mode)";

/// Response to a create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
    pub message: String,
}

impl CreateResponse {
    pub fn offline(id: impl Into<String>, message: &str) -> Self {
        Self {
            id: id.into(),
            message: format!("{}{}", message, OFFLINE_SUFFIX),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.message.contains("offline mode")
    }
}

/// Response carrying only a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn offline(message: &str) -> Self {
        Self {
            message: format!("{}{}", message, OFFLINE_SUFFIX),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.message.contains("offline mode")
    }
}

/// Health endpoint payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub storage: String,
    pub database_connected: bool,
}

// ============================================================================
// Stats
// ============================================================================

/// Aggregate counts over both collections. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub build_logs: BuildLogStats,
    pub generated_code: GeneratedCodeStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildLogStats {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub by_type: TypeBuckets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeBuckets {
    pub jtaf: usize,
    pub floating: usize,
    pub os_making: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCodeStats {
    pub total: usize,
    pub limit: usize,
}

impl Default for GeneratedCodeStats {
    fn default() -> Self {
        Self {
            total: 0,
            limit: GENERATED_CODE_CAP,
        }
    }
}

impl StatsSnapshot {
    /// Count build logs by status and type bucket
    pub fn from_records(build_logs: &[BuildLogRecord], generated_code_total: usize) -> Self {
        let mut stats = BuildLogStats {
            total: build_logs.len(),
            ..Default::default()
        };

        for log in build_logs {
            match log.status {
                BuildStatus::Running => stats.running += 1,
                BuildStatus::Completed => stats.completed += 1,
                BuildStatus::Failed => stats.failed += 1,
            }
            match log.kind.as_str() {
                JTAF_FRAMEWORK => stats.by_type.jtaf += 1,
                FLOATING_FRAMEWORK => stats.by_type.floating += 1,
                OS_MAKING => stats.by_type.os_making += 1,
                _ => {}
            }
        }

        Self {
            build_logs: stats,
            generated_code: GeneratedCodeStats {
                total: generated_code_total,
                limit: GENERATED_CODE_CAP,
            },
        }
    }
}

// ============================================================================
// Jenkins
// ============================================================================

/// Request to trigger a (simulated) Jenkins job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenkinsJobRequest {
    pub build_id: String,
    pub job_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_username: Option<String>,
}

/// Details of a queued Jenkins job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JenkinsJobResult {
    pub job_name: String,
    pub queue_id: String,
    pub build_number: String,
    pub parameters: BTreeMap<String, String>,
    pub system_target: String,
    pub triggered_at: DateTime<Utc>,
}

/// Response of the trigger endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenkinsTriggerResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenkins_result: Option<JenkinsJobResult>,
    pub build_id: String,
}
