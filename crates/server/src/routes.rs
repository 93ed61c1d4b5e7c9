//! REST routes under `/api`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fhub_common::{
    BuildLogFilter, BuildLogRecord, BuildLogUpdate, BuildStatus, CreateResponse, Error,
    GeneratedCodeRecord, HealthStatus, JenkinsJobRequest, JenkinsTriggerResponse,
    MessageResponse, NewBuildLog, NewGeneratedCode, PageFilter, StatsSnapshot,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::jenkins;
use crate::storage::DocumentStore;

// ============================================================================
// State
// ============================================================================

pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

type Shared = State<Arc<AppState>>;

// ============================================================================
// Errors
// ============================================================================

/// Store error rendered as `{"detail": "..."}`
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            Error::NotFound { kind, .. } => {
                (StatusCode::NOT_FOUND, format!("{} not found", capitalize(kind)))
            }
            Error::AlreadyExists { kind, id } => (
                StatusCode::CONFLICT,
                format!("{} {} already exists", capitalize(kind), id),
            ),
            Error::MalformedRecord(_) | Error::InvalidConfig(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Router
// ============================================================================

/// Every route, nested under `/api`
pub fn router(store: Arc<dyn DocumentStore>) -> Router {
    let state = Arc::new(AppState { store });

    let api = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/build-logs",
            post(create_build_log).get(list_build_logs).delete(clear_build_logs),
        )
        .route(
            "/build-logs/:build_id",
            get(get_build_log).put(update_build_log).delete(delete_build_log),
        )
        .route(
            "/generated-code",
            post(create_generated_code)
                .get(list_generated_code)
                .delete(clear_generated_code),
        )
        .route(
            "/generated-code/:id",
            get(get_generated_code).delete(delete_generated_code),
        )
        .route("/stats", get(stats_handler))
        .route("/jenkins/trigger", post(jenkins_trigger_handler));

    Router::new()
        .nest("/api", api)
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}

async fn health_handler(State(state): Shared) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        storage: state.store.label().to_string(),
        database_connected: state.store.is_persistent(),
    })
}

// ============================================================================
// Build logs
// ============================================================================

async fn create_build_log(
    State(state): Shared,
    Json(input): Json<NewBuildLog>,
) -> ApiResult<CreateResponse> {
    let record = input.into_record(Uuid::new_v4().to_string());
    state.store.insert_build_log(&record)?;
    info!("Build log {} created", record.build_id);
    Ok(Json(CreateResponse {
        id: record.id,
        message: "Build log created successfully".to_string(),
    }))
}

/// Build-log list query. Status stays a string so unknown values match nothing.
#[derive(Debug, Deserialize)]
struct BuildLogQuery {
    skip: Option<usize>,
    limit: Option<usize>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn list_build_logs(
    State(state): Shared,
    Query(query): Query<BuildLogQuery>,
) -> ApiResult<Vec<BuildLogRecord>> {
    debug!("Listing build logs: {:?}", query);
    let status = match query.status.as_deref().map(str::parse::<BuildStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => return Ok(Json(Vec::new())),
    };
    let filter = BuildLogFilter {
        skip: query.skip,
        limit: query.limit,
        status,
        kind: query.kind,
    };
    Ok(Json(state.store.list_build_logs(&filter)?))
}

async fn get_build_log(
    State(state): Shared,
    Path(build_id): Path<String>,
) -> ApiResult<BuildLogRecord> {
    state
        .store
        .get_build_log(&build_id)?
        .map(Json)
        .ok_or_else(|| Error::not_found("build log", build_id).into())
}

async fn update_build_log(
    State(state): Shared,
    Path(build_id): Path<String>,
    Json(update): Json<BuildLogUpdate>,
) -> ApiResult<MessageResponse> {
    if !state.store.update_build_log(&build_id, &update)? {
        return Err(Error::not_found("build log", build_id).into());
    }
    info!("Build log {} updated", build_id);
    Ok(Json(MessageResponse::new("Build log updated successfully")))
}

async fn delete_build_log(
    State(state): Shared,
    Path(build_id): Path<String>,
) -> ApiResult<MessageResponse> {
    if !state.store.delete_build_log(&build_id)? {
        return Err(Error::not_found("build log", build_id).into());
    }
    Ok(Json(MessageResponse::new("Build log deleted successfully")))
}

async fn clear_build_logs(State(state): Shared) -> ApiResult<MessageResponse> {
    let count = state.store.clear_build_logs()?;
    info!("Cleared {} build logs", count);
    Ok(Json(MessageResponse::new(format!("Deleted {} build logs", count))))
}

// ============================================================================
// Generated code
// ============================================================================

async fn create_generated_code(
    State(state): Shared,
    Json(input): Json<NewGeneratedCode>,
) -> ApiResult<CreateResponse> {
    let record = input.into_record(Uuid::new_v4().to_string());
    state.store.insert_generated_code(&record)?;
    Ok(Json(CreateResponse {
        id: record.id,
        message: "Generated code saved successfully".to_string(),
    }))
}

async fn list_generated_code(
    State(state): Shared,
    Query(page): Query<PageFilter>,
) -> ApiResult<Vec<GeneratedCodeRecord>> {
    Ok(Json(state.store.list_generated_code(&page)?))
}

async fn get_generated_code(
    State(state): Shared,
    Path(id): Path<String>,
) -> ApiResult<GeneratedCodeRecord> {
    state
        .store
        .get_generated_code(&id)?
        .map(Json)
        .ok_or_else(|| Error::not_found("generated code", id).into())
}

async fn delete_generated_code(
    State(state): Shared,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    if !state.store.delete_generated_code(&id)? {
        return Err(Error::not_found("generated code", id).into());
    }
    Ok(Json(MessageResponse::new("Generated code deleted successfully")))
}

async fn clear_generated_code(State(state): Shared) -> ApiResult<MessageResponse> {
    let count = state.store.clear_generated_code()?;
    Ok(Json(MessageResponse::new(format!(
        "Deleted {} generated code entries",
        count
    ))))
}

// ============================================================================
// Stats and Jenkins
// ============================================================================

async fn stats_handler(State(state): Shared) -> ApiResult<StatsSnapshot> {
    Ok(Json(state.store.stats()?))
}

async fn jenkins_trigger_handler(
    Json(request): Json<JenkinsJobRequest>,
) -> Json<JenkinsTriggerResponse> {
    Json(jenkins::trigger(&request, Utc::now()))
}
