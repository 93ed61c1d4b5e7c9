//! End-to-end behavior of the resource clients in both modes
//!
//! Online tests run the real backend router on an ephemeral port. Offline
//! tests pin the selector to local storage over an in-process namespace.

use chrono::{TimeZone, Utc};
use fhub_client::{
    BackendSelector, FixedSelector, HealthProber, Hub, Mode, PerCallSelector, RemoteApi,
    SessionSelector,
};
use fhub_common::{
    BuildLogFilter, BuildLogRecord, BuildLogUpdate, BuildStatus, Error, JenkinsJobRequest,
    KeyValueStore, LocalStore, MemoryKv, NewBuildLog, NewGeneratedCode, PageFilter, PIPELINES,
};
use fhub_server::MemoryDocuments;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = fhub_server::router(Arc::new(MemoryDocuments::new()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// Backend that answers 503 to everything once `up` is cleared
async fn spawn_switchable_server() -> (String, Arc<AtomicBool>) {
    use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse};

    let up = Arc::new(AtomicBool::new(true));
    let gate = up.clone();
    let app = fhub_server::router(Arc::new(MemoryDocuments::new())).layer(
        axum::middleware::from_fn(move |req: Request, next: Next| {
            let gate = gate.clone();
            async move {
                if gate.load(Ordering::SeqCst) {
                    next.run(req).await
                } else {
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), up)
}

fn selected_hub(selector: Arc<dyn BackendSelector>, prober: HealthProber, url: &str) -> Hub {
    Hub::with_parts(
        selector,
        prober,
        RemoteApi::new(reqwest::Client::new(), url),
        LocalStore::in_memory(),
    )
}

fn hub(mode: Mode, base_url: &str, local: LocalStore) -> Hub {
    let client = reqwest::Client::new();
    let prober = HealthProber::new(client.clone(), base_url, Duration::from_secs(2));
    Hub::with_parts(
        Arc::new(FixedSelector(mode)),
        prober,
        RemoteApi::new(client, base_url),
        local,
    )
}

fn offline_hub() -> Hub {
    hub(Mode::Local, "http://127.0.0.1:9/api", LocalStore::in_memory())
}

async fn online_hub() -> Hub {
    let url = spawn_server().await;
    hub(Mode::Remote, &url, LocalStore::in_memory())
}

async fn both_modes() -> Vec<(&'static str, Hub)> {
    vec![("offline", offline_hub()), ("online", online_hub().await)]
}

fn jtaf_1() -> NewBuildLog {
    let mut input = NewBuildLog::started("JTAF-1", "JTAF Framework", "jtaf-pipeline");
    input.start_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    input.config = serde_json::json!({"testSuite": "smoke"});
    input.command = Some("run-tests".to_string());
    input
}

fn assert_same_fields(record: &BuildLogRecord, input: &NewBuildLog) {
    assert_eq!(record.build_id, input.build_id);
    assert_eq!(record.kind, input.kind);
    assert_eq!(record.status, input.status);
    assert_eq!(record.start_time, input.start_time);
    assert_eq!(record.end_time, input.end_time);
    assert_eq!(record.config, input.config);
    assert_eq!(record.command, input.command);
    assert_eq!(record.jenkins_job, input.jenkins_job);
    assert_eq!(record.output_log, input.output_log);
}

#[tokio::test]
async fn test_create_then_get_returns_input() {
    for (mode, hub) in both_modes().await {
        let input = jtaf_1();
        let created = hub.build_logs.create(&input).await.unwrap();
        assert_eq!(created.is_offline(), mode == "offline", "{}", mode);

        let record = hub.build_logs.get_by_id("JTAF-1").await.unwrap();
        assert_same_fields(&record, &input);
    }
}

#[tokio::test]
async fn test_reads_are_stable() {
    for (mode, hub) in both_modes().await {
        for i in 0..3 {
            let mut input = jtaf_1();
            input.build_id = format!("B-{}", i);
            input.start_time = input.start_time + chrono::Duration::minutes(i);
            hub.build_logs.create(&input).await.unwrap();
        }

        let first = hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap();
        let second = hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap();
        assert_eq!(first, second, "{}", mode);

        let ids: Vec<_> = first.iter().map(|r| r.build_id.as_str()).collect();
        assert_eq!(ids, vec!["B-2", "B-1", "B-0"], "{}", mode);
    }
}

#[tokio::test]
async fn test_update_merges_fields() {
    for (mode, hub) in both_modes().await {
        let input = jtaf_1();
        hub.build_logs.create(&input).await.unwrap();

        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
        let resp = hub
            .build_logs
            .update("JTAF-1", &BuildLogUpdate::finished(BuildStatus::Completed, end))
            .await
            .unwrap();
        assert_eq!(resp.is_offline(), mode == "offline", "{}", mode);

        let record = hub.build_logs.get_by_id("JTAF-1").await.unwrap();
        assert_eq!(record.status, BuildStatus::Completed);
        assert_eq!(record.end_time, Some(end));
        assert_eq!(record.kind, input.kind);
        assert_eq!(record.config, input.config);
        assert_eq!(record.jenkins_job, input.jenkins_job);
    }
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    for (mode, hub) in both_modes().await {
        hub.build_logs.create(&jtaf_1()).await.unwrap();
        hub.build_logs.delete("JTAF-1").await.unwrap();

        let err = hub.build_logs.get_by_id("JTAF-1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "{}: {}", mode, err);
        let all = hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap();
        assert!(all.iter().all(|r| r.build_id != "JTAF-1"), "{}", mode);
    }
}

#[tokio::test]
async fn test_clear_all_empties_both_collections() {
    for (mode, hub) in both_modes().await {
        hub.build_logs.create(&jtaf_1()).await.unwrap();
        hub.generated_code
            .create(&NewGeneratedCode::new("go", "api", "package main", "demo"))
            .await
            .unwrap();

        let resp = hub.build_logs.clear_all().await.unwrap();
        assert!(resp.message.starts_with("Deleted 1 build logs"), "{}", mode);
        let resp = hub.generated_code.clear_all().await.unwrap();
        assert!(resp.message.starts_with("Deleted 1 generated code entries"), "{}", mode);

        assert!(hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap().is_empty());
        assert!(hub.generated_code.get_all(&PageFilter::default()).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_offline_scenario_jtaf() {
    let hub = offline_hub();
    hub.build_logs.create(&jtaf_1()).await.unwrap();

    let all = hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "JTAF-1");

    let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
    hub.build_logs
        .update("JTAF-1", &BuildLogUpdate::finished(BuildStatus::Failed, end))
        .await
        .unwrap();

    let record = hub.build_logs.get_by_id("JTAF-1").await.unwrap();
    assert_eq!(record.status, BuildStatus::Failed);
    assert_eq!(record.end_time, Some(end));
    assert_eq!(record.kind, "JTAF Framework");
}

#[tokio::test]
async fn test_generated_code_newest_first() {
    for (mode, hub) in both_modes().await {
        for lang in ["python", "go", "rust"] {
            hub.generated_code
                .create(&NewGeneratedCode::new(lang, "snippet", "code", "desc"))
                .await
                .unwrap();
        }
        let page = hub.generated_code.get_all(&PageFilter::limit(2)).await.unwrap();
        let langs: Vec<_> = page.iter().map(|c| c.language.as_str()).collect();
        assert_eq!(langs, vec!["rust", "go"], "{}", mode);

        let one = hub.generated_code.get_by_id(&page[0].id).await.unwrap();
        assert_eq!(one, page[0]);
    }
}

#[tokio::test]
async fn test_offline_cap_keeps_ten_newest() {
    let hub = offline_hub();
    for i in 0..11 {
        hub.generated_code
            .create(&NewGeneratedCode::new(format!("lang-{}", i), "snippet", "code", "desc"))
            .await
            .unwrap();
    }

    let all = hub.generated_code.get_all(&PageFilter::limit(50)).await.unwrap();
    assert_eq!(all.len(), 10);
    assert_eq!(all[0].language, "lang-10");
    assert!(all.iter().all(|c| c.language != "lang-0"));

    let ids: std::collections::HashSet<_> = all.iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn test_online_store_is_uncapped() {
    let hub = online_hub().await;
    for i in 0..12 {
        hub.generated_code
            .create(&NewGeneratedCode::new(format!("lang-{}", i), "snippet", "code", "desc"))
            .await
            .unwrap();
    }
    assert_eq!(hub.generated_code.get_all(&PageFilter::default()).await.unwrap().len(), 10);
    assert_eq!(hub.generated_code.get_all(&PageFilter::limit(50)).await.unwrap().len(), 12);
    assert_eq!(hub.stats.get().await.unwrap().generated_code.total, 12);
}

#[tokio::test]
async fn test_stats_in_both_modes() {
    for (mode, hub) in both_modes().await {
        let mut os = NewBuildLog::started("OS-1", "OS Making", "os-making-pipeline");
        os.status = BuildStatus::Failed;
        hub.build_logs.create(&jtaf_1()).await.unwrap();
        hub.build_logs.create(&os).await.unwrap();
        hub.generated_code
            .create(&NewGeneratedCode::new("rust", "api", "code", "desc"))
            .await
            .unwrap();

        let stats = hub.stats.get().await.unwrap();
        assert_eq!(stats.build_logs.total, 2, "{}", mode);
        assert_eq!(stats.build_logs.running, 1, "{}", mode);
        assert_eq!(stats.build_logs.failed, 1, "{}", mode);
        assert_eq!(stats.build_logs.by_type.jtaf, 1, "{}", mode);
        assert_eq!(stats.build_logs.by_type.os_making, 1, "{}", mode);
        assert_eq!(stats.generated_code.total, 1, "{}", mode);
        assert_eq!(stats.generated_code.limit, 10, "{}", mode);
    }
}

#[tokio::test]
async fn test_online_errors_propagate() {
    let hub = online_hub().await;

    let err = hub.build_logs.get_by_id("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = hub
        .build_logs
        .update("missing", &BuildLogUpdate::finished(BuildStatus::Failed, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    hub.build_logs.create(&jtaf_1()).await.unwrap();
    let err = hub.build_logs.create(&jtaf_1()).await.unwrap_err();
    assert!(matches!(err, Error::RequestFailed { .. }), "{}", err);
}

#[tokio::test]
async fn test_unreachable_api_falls_back_to_local() {
    let client = reqwest::Client::new();
    let url = "http://127.0.0.1:9/api";
    let prober = HealthProber::new(client.clone(), url, Duration::from_millis(300));
    let local = LocalStore::in_memory();
    let hub = Hub::with_parts(
        Arc::new(PerCallSelector::new(prober.clone())),
        prober,
        RemoteApi::new(client, url),
        local.clone(),
    );

    let resp = hub.build_logs.create(&jtaf_1()).await.unwrap();
    assert_eq!(resp.id, "JTAF-1");
    assert_eq!(resp.message, "Build log created successfully (offline mode)");
    assert_eq!(local.read_all(PIPELINES).len(), 1);
    assert!(!hub.is_online().await);
}

#[tokio::test]
async fn test_per_call_selection_follows_server_going_down() {
    let (url, up) = spawn_switchable_server().await;
    let prober = HealthProber::new(reqwest::Client::new(), &url, Duration::from_secs(2));
    let selector = Arc::new(PerCallSelector::new(prober.clone()));
    let hub = selected_hub(selector.clone(), prober, &url);

    assert_eq!(selector.select().await, Mode::Remote);
    let resp = hub.build_logs.create(&jtaf_1()).await.unwrap();
    assert!(!resp.is_offline(), "{}", resp.message);

    up.store(false, Ordering::SeqCst);
    assert_eq!(selector.select().await, Mode::Local);
    let resp = hub.build_logs.create(&jtaf_1()).await.unwrap();
    assert_eq!(resp.message, "Build log created successfully (offline mode)");

    up.store(true, Ordering::SeqCst);
    assert_eq!(selector.select().await, Mode::Remote);
}

#[tokio::test]
async fn test_session_selection_sticks_after_server_goes_down() {
    let (url, up) = spawn_switchable_server().await;
    let prober = HealthProber::new(reqwest::Client::new(), &url, Duration::from_secs(2));
    let selector = Arc::new(SessionSelector::new(prober.clone()));
    let hub = selected_hub(selector.clone(), prober, &url);

    hub.build_logs.create(&jtaf_1()).await.unwrap();
    up.store(false, Ordering::SeqCst);

    assert_eq!(selector.select().await, Mode::Remote);
    assert!(!hub.is_online().await);
    let err = hub.build_logs.get_by_id("JTAF-1").await.unwrap_err();
    assert!(matches!(err, Error::RequestFailed { .. }), "{}", err);
}

#[tokio::test]
async fn test_remote_unreachable_after_selection_falls_back() {
    // Selector says remote, but nothing listens there
    let hub = hub(Mode::Remote, "http://127.0.0.1:9/api", LocalStore::in_memory());
    let resp = hub
        .generated_code
        .create(&NewGeneratedCode::new("rust", "api", "code", "desc"))
        .await
        .unwrap();
    assert!(resp.is_offline());
    assert_eq!(hub.generated_code.get_all(&PageFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_modes_do_not_share_records() {
    let url = spawn_server().await;
    let local = LocalStore::in_memory();
    let online = hub(Mode::Remote, &url, local.clone());
    let offline = hub(Mode::Local, &url, local);

    online.build_logs.create(&jtaf_1()).await.unwrap();
    assert!(offline
        .build_logs
        .get_all(&BuildLogFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_legacy_local_records_are_readable() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(
        PIPELINES,
        r#"[{"id":"OS-7","build_id":"OS-7","type":"OS Making","status":"completed",
            "startTime":"2024-05-01T08:00:00Z","endTime":"2024-05-01T08:40:00Z",
            "config":{},"jenkinsJob":"os-making-pipeline"}]"#,
    )
    .unwrap();
    let hub = hub(Mode::Local, "http://127.0.0.1:9/api", LocalStore::new(kv));

    let record = hub.build_logs.get_by_id("OS-7").await.unwrap();
    assert_eq!(record.jenkins_job, "os-making-pipeline");
    assert_eq!(
        record.end_time,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 40, 0).unwrap())
    );
    assert_eq!(hub.stats.get().await.unwrap().build_logs.completed, 1);
}

#[tokio::test]
async fn test_malformed_local_collection_reads_empty() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(PIPELINES, "{not json").unwrap();
    let hub = hub(Mode::Local, "http://127.0.0.1:9/api", LocalStore::new(kv));

    assert!(hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap().is_empty());
    hub.build_logs.create(&jtaf_1()).await.unwrap();
    assert_eq!(hub.build_logs.get_all(&BuildLogFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_jenkins_trigger_ack_and_warning() {
    let hub = online_hub().await;
    let mut request = JenkinsJobRequest {
        build_id: "JTAF-1".to_string(),
        job_type: "JTAF Framework".to_string(),
        config: serde_json::json!({"browser": "firefox"}),
        command: "run".to_string(),
        system_ip: Some("10.0.0.2".to_string()),
        system_port: Some("2222".to_string()),
        system_username: Some("qa".to_string()),
    };

    let ack = hub.jenkins.trigger(&request).await.unwrap();
    let job = ack.job.unwrap();
    assert_eq!(job.job_name, "jtaf-framework-pipeline");
    assert_eq!(job.system_target, "10.0.0.2:2222");
    assert_eq!(job.parameters["BROWSER"], "firefox");

    request.system_ip = None;
    request.system_port = None;
    request.system_username = None;
    let ack = hub.jenkins.trigger(&request).await.unwrap();
    assert_eq!(ack.job.unwrap().system_target, "localhost:22");

    request.system_ip = Some(String::new());
    let warning = hub.jenkins.trigger(&request).await.unwrap_err();
    assert!(matches!(warning, fhub_client::TriggerWarning::Rejected(_)));
}
