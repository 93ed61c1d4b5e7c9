//! Simulated Jenkins trigger
//!
//! Maps a job request to a Jenkins job name and build parameters and
//! reports it as queued. Nothing is contacted.

use chrono::{DateTime, Utc};
use fhub_common::{
    JenkinsJobRequest, JenkinsJobResult, JenkinsTriggerResponse, FLOATING_FRAMEWORK,
    JTAF_FRAMEWORK, OS_MAKING,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

const DEFAULT_SYSTEM_IP: &str = "localhost";
const DEFAULT_SYSTEM_PORT: &str = "22";
const DEFAULT_SYSTEM_USERNAME: &str = "admin";

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value.as_deref().unwrap_or(default)
}

/// Jenkins job for a build type
pub fn job_name(job_type: &str) -> &'static str {
    match job_type {
        JTAF_FRAMEWORK => "jtaf-framework-pipeline",
        FLOATING_FRAMEWORK => "floating-framework-pipeline",
        OS_MAKING => "os-making-pipeline",
        _ => "default-pipeline",
    }
}

/// String form of a config value, or `default` when absent or null
fn config_str(config: &Value, key: &str, default: &str) -> String {
    match config.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Build parameters: the common fields plus the job-specific config keys
pub fn build_parameters(request: &JenkinsJobRequest) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("BUILD_ID".to_string(), request.build_id.clone());
    params.insert("JOB_TYPE".to_string(), request.job_type.clone());
    params.insert(
        "SYSTEM_IP".to_string(),
        or_default(&request.system_ip, DEFAULT_SYSTEM_IP).to_string(),
    );
    params.insert(
        "SYSTEM_PORT".to_string(),
        or_default(&request.system_port, DEFAULT_SYSTEM_PORT).to_string(),
    );
    params.insert(
        "SYSTEM_USERNAME".to_string(),
        or_default(&request.system_username, DEFAULT_SYSTEM_USERNAME).to_string(),
    );
    params.insert("COMMAND".to_string(), request.command.clone());

    let config = &request.config;
    let specific: &[(&str, &str, &str)] = match request.job_type.as_str() {
        JTAF_FRAMEWORK => &[
            ("TEST_SUITE", "testSuite", ""),
            ("BROWSER", "browser", "chrome"),
            ("ENVIRONMENT", "environment", "dev"),
            ("PARALLEL_EXECUTION", "parallelExecution", "false"),
        ],
        FLOATING_FRAMEWORK => &[
            ("FRAMEWORK_VERSION", "version", "latest"),
            ("DEPLOYMENT_TARGET", "target", "staging"),
            ("CONFIGURATION_FILE", "configFile", "default.conf"),
        ],
        OS_MAKING => &[
            ("OS_TYPE", "osType", "linux"),
            ("ARCHITECTURE", "architecture", "x64"),
            ("BUILD_TYPE", "buildType", "release"),
        ],
        _ => &[],
    };
    for (param, key, default) in specific {
        params.insert(param.to_string(), config_str(config, key, default));
    }

    params
}

/// Absent fields take their defaults; only explicitly blank ones fail
fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| v.trim().is_empty())
}

/// Queue a simulated job at `now`
pub fn trigger(request: &JenkinsJobRequest, now: DateTime<Utc>) -> JenkinsTriggerResponse {
    let job_name = job_name(&request.job_type);

    if blank(&request.system_ip) || blank(&request.system_username) {
        warn!(
            "Jenkins trigger for {}: system connection test failed, blank target",
            request.build_id
        );
        return JenkinsTriggerResponse {
            success: false,
            message: "System connection test failed".to_string(),
            jenkins_result: None,
            build_id: request.build_id.clone(),
        };
    }

    let port = or_default(&request.system_port, DEFAULT_SYSTEM_PORT);
    let system_ip = or_default(&request.system_ip, DEFAULT_SYSTEM_IP);
    let stamp = now.timestamp();

    info!("Queued Jenkins job {} for {}", job_name, request.build_id);

    JenkinsTriggerResponse {
        success: true,
        message: format!("Jenkins job {} triggered successfully", job_name),
        jenkins_result: Some(JenkinsJobResult {
            job_name: job_name.to_string(),
            queue_id: format!("queue-{}", stamp),
            build_number: format!("build-{}", stamp),
            parameters: build_parameters(request),
            system_target: format!("{}:{}", system_ip, port),
            triggered_at: now,
        }),
        build_id: request.build_id.clone(),
    }
}
