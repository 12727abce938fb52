#![allow(clippy::unwrap_used)]
// Integration tests for the `Dashboard` coordinator against a mocked monitor.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dockmon_api::{MonitorClient, UpdateOutcome};
use dockmon_core::{
    AlwaysVisible, CachedSnapshot, CoreError, Dashboard, DashboardConfig, Language,
    ManualVisibility, MemorySnapshotCache, NotificationKind, PollOutcome, PollRequest,
    ResourcesCell, SettingsInput, SnapshotCache, StatusCell, VisibilityTracker,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> DashboardConfig {
    let mut config = DashboardConfig::new(Url::parse(&server.uri()).unwrap());
    config.language = Language::En;
    config
}

fn dashboard(
    server: &MockServer,
    config: DashboardConfig,
    cache: Arc<dyn SnapshotCache>,
    tracker: Arc<dyn VisibilityTracker>,
) -> Dashboard {
    let client = MonitorClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        None,
    );
    Dashboard::with_components(config, client, cache, tracker)
}

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let dash = dashboard(
        &server,
        config(&server),
        Arc::new(MemorySnapshotCache::new()),
        Arc::new(AlwaysVisible),
    );
    (server, dash)
}

fn web_snapshot(cpu: f64) -> serde_json::Value {
    json!({
        "status": "ok",
        "updates": { "web": "update_available", "db": "up_to_date" },
        "meta": {
            "web": {
                "state": "running",
                "image": "ghcr.io/acme/web:2.1",
                "cpu": cpu,
                "mem_usage": 100,
                "mem_limit": 1000,
                "net_rx": 0,
                "net_tx": 0
            },
            "db": { "state": "running", "image": "postgres:16" }
        }
    })
}

async fn mount_status(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_live_poll_builds_rows_and_caches() {
    let server = MockServer::start().await;
    let cache = Arc::new(MemorySnapshotCache::new());
    let dash = dashboard(&server, config(&server), cache.clone(), Arc::new(AlwaysVisible));
    mount_status(&server, web_snapshot(12.3)).await;

    assert_eq!(dash.poll(PollRequest::INITIAL).await, PollOutcome::Live);

    let rows = dash.rows_snapshot();
    assert_eq!(rows.len(), 2);
    let web = &rows[0];
    assert_eq!(web.name, "web");
    assert!(matches!(web.status, StatusCell::Tag { .. }));
    assert!(web.action_enabled);
    assert_eq!(web.metrics().unwrap().cpu.as_ref().unwrap().text, "12.3%");
    assert_eq!(web.link.as_ref().unwrap().url.as_deref(), Some("https://github.com/acme/web"));
    // No figures for db yet: skeleton until the lazy pass fills it.
    assert_eq!(rows[1].resources, ResourcesCell::Loading);

    assert!(cache.load().unwrap().is_some());
    assert!(dash.visible().contains("db"));
}

#[tokio::test]
async fn test_failed_poll_shows_cache_as_pending() {
    let server = MockServer::start().await;
    let cached: dockmon_api::StatusSnapshot = serde_json::from_value(web_snapshot(50.0)).unwrap();
    let cache = Arc::new(MemorySnapshotCache::with_entry(CachedSnapshot::now(cached)));
    let dash = dashboard(&server, config(&server), cache, Arc::new(AlwaysVisible));

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    assert_eq!(dash.poll(PollRequest::FAST).await, PollOutcome::Cached);

    let rows = dash.rows_snapshot();
    assert_eq!(rows.len(), 2);
    for row in rows.iter() {
        assert!(row.is_pending());
        assert_eq!(row.resources, ResourcesCell::Loading);
        assert!(row.action_enabled);
    }
}

#[tokio::test]
async fn test_failed_poll_without_cache_leaves_view() {
    let (server, dash) = setup().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert_eq!(dash.poll(PollRequest::FAST).await, PollOutcome::Unchanged);
    assert!(dash.rows_snapshot().is_empty());
}

#[tokio::test]
async fn test_overlapping_poll_is_skipped() {
    let (server, dash) = setup().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(web_snapshot(1.0))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(dash.poll(PollRequest::FAST), dash.poll(PollRequest::FAST));
    assert_eq!(first, PollOutcome::Live);
    assert_eq!(second, PollOutcome::Skipped);
}

#[tokio::test]
async fn test_returning_container_restarts_smoothing() {
    let (server, dash) = setup().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_snapshot(80.0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "updates": { "db": "up_to_date" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_status(&server, web_snapshot(10.0)).await;

    dash.poll(PollRequest::FAST).await;
    dash.poll(PollRequest::FAST).await;
    assert!(dash.rows_snapshot().iter().all(|r| r.name != "web"));
    assert!(!dash.visible().contains("web"));

    dash.poll(PollRequest::FAST).await;
    let rows = dash.rows_snapshot();
    let web = rows.iter().find(|r| r.name == "web").unwrap();
    assert_eq!(web.metrics().unwrap().cpu.as_ref().unwrap().text, "10%");
}

#[tokio::test]
async fn test_lazy_fill_only_touches_visible_rows() {
    let server = MockServer::start().await;
    let tracker = Arc::new(ManualVisibility::new());
    let dash = dashboard(
        &server,
        config(&server),
        Arc::new(MemorySnapshotCache::new()),
        tracker.clone(),
    );
    mount_status(
        &server,
        json!({
            "status": "ok",
            "updates": { "a": "up_to_date", "b": "up_to_date", "c": "up_to_date" }
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/metrics/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "meta": { "state": "running", "cpu": 5.0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    dash.poll(PollRequest::FAST).await;
    assert_eq!(tracker.observed(), 3);
    tracker.enter("b");

    assert_eq!(dash.fill_visible_metrics().await, 1);
    let rows = dash.rows_snapshot();
    assert_eq!(rows[0].resources, ResourcesCell::Loading);
    assert_eq!(rows[1].metrics().unwrap().cpu.as_ref().unwrap().text, "5%");
    assert_eq!(rows[2].resources, ResourcesCell::Loading);
}

async fn metrics_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/metrics/"))
        .count()
}

#[tokio::test]
async fn test_overlapping_metrics_passes_stay_within_one_batch() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.batch_size = 50;
    let dash = dashboard(
        &server,
        config,
        Arc::new(MemorySnapshotCache::new()),
        Arc::new(AlwaysVisible),
    );
    let updates: serde_json::Map<String, serde_json::Value> = (0..12)
        .map(|i| (format!("c{i:02}"), json!("up_to_date")))
        .collect();
    mount_status(&server, json!({ "status": "ok", "updates": updates })).await;
    Mock::given(method("GET"))
        .and(path_regex("^/metrics/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "meta": { "state": "running", "cpu": 1.0 } }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    assert_eq!(dash.poll(PollRequest::FAST).await, PollOutcome::Live);
    let first = tokio::spawn({
        let dash = dash.clone();
        async move { dash.fill_visible_metrics().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Every other way of starting a pass while one runs.
    assert_eq!(dash.fill_visible_metrics().await, 0);
    assert_eq!(dash.poll_cycle(PollRequest::FAST).await, PollOutcome::Live);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let in_flight = metrics_requests(&server).await;
    assert!(in_flight <= 6, "{in_flight} metrics requests in flight");

    assert_eq!(first.await.unwrap(), 12);
    assert_eq!(metrics_requests(&server).await, 12);
}

// ── Row actions ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_notifies_and_clears_flag() {
    let (server, dash) = setup().await;
    mount_status(&server, web_snapshot(1.0)).await;
    Mock::given(method("POST"))
        .and(path("/update_container"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updated": true,
            "message": "Container recreated"
        })))
        .mount(&server)
        .await;

    dash.poll(PollRequest::FAST).await;
    let mut notes = dash.notifications();

    let outcome = dash.update_entity("web").await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated);

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, NotificationKind::Success);
    assert_eq!(note.message, "✅ web updated");
    let web = dash.rows_snapshot()[0].clone();
    assert!(!web.updating);
}

#[tokio::test]
async fn test_update_failure_is_reported() {
    let (server, dash) = setup().await;
    mount_status(&server, web_snapshot(1.0)).await;
    Mock::given(method("POST"))
        .and(path("/update_container"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "pull failed" })))
        .mount(&server)
        .await;

    dash.poll(PollRequest::FAST).await;
    let mut notes = dash.notifications();

    let err = dash.update_entity("web").await.unwrap_err();
    assert!(matches!(err, CoreError::ActionFailed { .. }));
    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, NotificationKind::Error);
    assert_eq!(note.message, "❌ web: pull failed");
    assert!(!dash.rows_snapshot()[0].updating);
}

#[tokio::test]
async fn test_update_refused_for_unresolvable_container() {
    let (server, dash) = setup().await;
    mount_status(
        &server,
        json!({ "status": "ok", "updates": { "ghost": "not_found" } }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/update_container"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    dash.poll(PollRequest::FAST).await;
    let err = dash.update_entity("ghost").await.unwrap_err();
    assert!(matches!(err, CoreError::ActionFailed { .. }));
}

#[tokio::test]
async fn test_refresh_entity_clears_flag_on_both_paths() {
    let (server, dash) = setup().await;
    mount_status(&server, web_snapshot(1.0)).await;
    Mock::given(method("GET"))
        .and(path("/status/web"))
        .and(query_param("force", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "updates": { "web": "up_to_date" },
            "meta": { "web": { "state": "running", "cpu": 3.0 } }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/web"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    dash.poll(PollRequest::FAST).await;

    let view = dash.refresh_entity("web").await.unwrap();
    assert!(!view.refreshing);
    assert!(matches!(
        view.status,
        StatusCell::Tag { status: dockmon_core::EntityStatus::UpToDate, .. }
    ));

    let mut notes = dash.notifications();
    assert!(dash.refresh_entity("web").await.is_err());
    assert!(!dash.rows_snapshot()[0].refreshing);
    assert_eq!(notes.try_recv().unwrap().kind, NotificationKind::Error);

    assert!(matches!(
        dash.refresh_entity("nope").await.unwrap_err(),
        CoreError::EntityNotFound { .. }
    ));
}

#[tokio::test]
async fn test_prune_failure_notifies_and_refreshes_count() {
    let (server, dash) = setup().await;
    mount_status(&server, web_snapshot(1.0)).await;
    Mock::given(method("POST"))
        .and(path("/images/prune"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "daemon down" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/unused"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3, "items": [] })))
        .mount(&server)
        .await;

    let mut notes = dash.notifications();
    let err = dash.prune_unused().await.unwrap_err();
    assert_eq!(err.to_string(), "daemon down");

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, NotificationKind::Error);
    assert_eq!(note.message, "Prune failed: daemon down");
    assert_eq!(*dash.unused_count().borrow(), Some(3));
    assert!(!dash.prune_in_flight());
}

#[tokio::test]
async fn test_prune_success_reports_space() {
    let (server, dash) = setup().await;
    mount_status(&server, web_snapshot(1.0)).await;
    Mock::given(method("POST"))
        .and(path("/images/prune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ImagesDeleted": [{ "Deleted": "sha256:abc" }],
            "SpaceReclaimed": 2048
        })))
        .mount(&server)
        .await;

    let mut notes = dash.notifications();
    let report = dash.prune_unused().await.unwrap();
    assert_eq!(report.deleted_count(), 1);
    assert_eq!(
        notes.try_recv().unwrap().message,
        "Prune done. Space reclaimed: 2048 bytes."
    );
}

// ── Settings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_masked_key_keeps_configured_key() {
    let server = MockServer::start().await;
    let cfg = config(&server).with_api_key(SecretString::from("s3cret".to_owned()));
    let dash = dashboard(
        &server,
        cfg,
        Arc::new(MemorySnapshotCache::new()),
        Arc::new(AlwaysVisible),
    );
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth_enabled": true,
            "api_key": "********",
            "allowed_cidrs": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .and(query_param("key", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_snapshot(1.0)))
        .expect(1)
        .mount(&server)
        .await;

    let auth = dash.load_settings().await.unwrap();
    assert!(auth.auth_enabled);
    assert!(dash.client().has_api_key());
    assert_eq!(dash.poll(PollRequest::FAST).await, PollOutcome::Live);
}

#[tokio::test]
async fn test_save_settings_failure_notifies() {
    let (server, dash) = setup().await;
    Mock::given(method("POST"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad cidr" })))
        .mount(&server)
        .await;

    let mut notes = dash.notifications();
    let input = SettingsInput {
        auth_enabled: true,
        api_key: None,
        allowed_cidrs: SettingsInput::parse_cidrs("not-a-cidr"),
    };
    assert!(dash.save_settings(input).await.is_err());
    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, NotificationKind::Error);
    assert!(note.message.starts_with("Error while saving"));
}

#[tokio::test]
async fn test_generate_key_attaches_new_key() {
    let (server, dash) = setup().await;
    Mock::given(method("POST"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth_enabled": true,
            "api_key": "fresh-key",
            "allowed_cidrs": ["10.0.0.0/8"]
        })))
        .mount(&server)
        .await;

    let auth = dash.generate_api_key(vec!["10.0.0.0/8".into()]).await.unwrap();
    assert!(auth.auth_enabled);
    assert!(auth.request_key().is_some());
    assert!(dash.client().has_api_key());
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_runs_startup_sequence_once() {
    let (server, dash) = setup().await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth_enabled": false,
            "api_key": "",
            "allowed_cidrs": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/unused"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 2, "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .and(query_param("force", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_snapshot(4.0)))
        .mount(&server)
        .await;

    dash.start().await.unwrap();
    assert_eq!(dash.rows_snapshot().len(), 2);
    assert_eq!(*dash.unused_count().borrow(), Some(2));
    assert!(matches!(dash.start().await, Err(CoreError::Internal(_))));

    dash.dispose().await;
    assert!(dash.rows_snapshot().is_empty());
    assert!(dash.visible().is_empty());
}

#[tokio::test]
async fn test_language_switch_changes_notifications() {
    let (server, dash) = setup().await;
    mount_status(&server, web_snapshot(1.0)).await;
    Mock::given(method("POST"))
        .and(path("/update_container"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updated": false,
            "message": "Already up to date"
        })))
        .mount(&server)
        .await;

    dash.poll(PollRequest::FAST).await;
    dash.set_language(Language::Fr);
    let mut notes = dash.notifications();

    assert_eq!(dash.update_entity("web").await.unwrap(), UpdateOutcome::AlreadyUpToDate);
    assert_eq!(notes.try_recv().unwrap().message, "✅ web est déjà à jour");
}
