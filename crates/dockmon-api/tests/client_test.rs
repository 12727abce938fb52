#![allow(clippy::unwrap_used)]
// Integration tests for `MonitorClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dockmon_api::{
    EntityStatus, Error, MonitorClient, SettingsUpdate, TransportConfig, UpdateOutcome,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MonitorClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = MonitorClient::with_client(reqwest::Client::new(), base_url, None);
    (server, client)
}

async fn setup_with_key(key: &str) -> (MockServer, MonitorClient) {
    let (server, client) = setup().await;
    client.set_api_key(Some(SecretString::from(key.to_owned())));
    (server, client)
}

// ── Status snapshot ─────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_status_decodes_snapshot() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "updates": { "web": "update_available", "db": "up_to_date" },
            "meta": {
                "web": {
                    "state": "running",
                    "image": "nginx:latest",
                    "cpu": 12.3,
                    "mem_usage": 100,
                    "mem_limit": 1000,
                    "net_rx": 0,
                    "net_tx": 0
                },
                "db": { "state": "running", "image": "postgres:16", "cpu": null }
            }
        })))
        .mount(&server)
        .await;

    let snapshot = client.fetch_status(false, false).await.unwrap();
    assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["web", "db"]);
    assert_eq!(snapshot.updates["web"], EntityStatus::UpdateAvailable);
    assert_eq!(snapshot.meta["web"].cpu, Some(12.3));
    assert_eq!(snapshot.meta["db"].cpu, None);
    assert_eq!(snapshot.meta["db"].image.as_deref(), Some("postgres:16"));
}

#[tokio::test]
async fn test_transport_client_asks_for_json() {
    let server = MockServer::start().await;
    let client = MonitorClient::new(
        Url::parse(&server.uri()).unwrap(),
        None,
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/status"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "updates": {} })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client.fetch_status(false, false).await.unwrap();
    assert_eq!(snapshot.names().count(), 0);
}

#[tokio::test]
async fn test_fetch_status_keeps_wire_order() {
    let (server, client) = setup().await;

    let body = r#"{"status":"ok","updates":{"zeta":"up_to_date","alpha":"not_found","mid":"update_available"},"meta":{}}"#;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let snapshot = client.fetch_status(false, false).await.unwrap();
    assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn test_fetch_status_sends_force_and_light() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .and(query_param("force", "1"))
        .and(query_param("light", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "updates": {}, "meta": {} })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client.fetch_status(true, true).await.unwrap();
    assert!(snapshot.updates.is_empty());
}

#[tokio::test]
async fn test_fetch_status_rejects_bad_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "degraded", "updates": {} })),
        )
        .mount(&server)
        .await;

    let result = client.fetch_status(false, false).await;
    assert!(
        matches!(result, Err(Error::Envelope { ref status }) if status == "degraded"),
        "expected Envelope error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_fetch_status_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "unauthorized" })))
        .mount(&server)
        .await;

    let err = client.fetch_status(false, false).await.unwrap_err();
    assert!(err.is_unauthorized(), "expected 401, got: {err:?}");
    assert_eq!(err.to_string(), "HTTP 401: unauthorized");
}

#[tokio::test]
async fn test_fetch_status_garbled_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = client.fetch_status(false, false).await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("proxy error")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Credentials ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_key_attached_to_authenticated_calls() {
    let (server, client) = setup_with_key("k3y").await;

    Mock::given(method("GET"))
        .and(path("/metrics/web"))
        .and(query_param("key", "k3y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "meta": { "cpu": 4.5, "net_rx": 2048, "net_tx": 1024 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let meta = client.fetch_entity_metrics("web").await.unwrap();
    assert_eq!(meta.cpu, Some(4.5));
    assert_eq!(meta.net_rx, Some(2048.0));
}

#[tokio::test]
async fn test_cleared_key_is_not_sent() {
    let (server, client) = setup_with_key("old").await;
    client.set_api_key(None);
    assert!(!client.has_api_key());

    Mock::given(method("GET"))
        .and(path("/images/unused"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3, "items": [] })))
        .mount(&server)
        .await;

    let unused = client.unused_images().await.unwrap();
    assert_eq!(unused.count, 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

// ── Single container ────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_entity_status_forced() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status/web"))
        .and(query_param("force", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "updates": { "web": "up_to_date" },
            "meta": { "web": { "state": "running" } }
        })))
        .mount(&server)
        .await;

    let snapshot = client.fetch_entity_status("web", true).await.unwrap();
    assert_eq!(snapshot.updates["web"], EntityStatus::UpToDate);
    assert_eq!(snapshot.meta["web"].state.as_deref(), Some("running"));
}

#[tokio::test]
async fn test_fetch_entity_metrics_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metrics/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "not_found" })))
        .mount(&server)
        .await;

    let err = client.fetch_entity_metrics("gone").await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Actions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_prune_reports_reclaimed_space() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/images/prune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ImagesDeleted": [{ "Deleted": "sha256:abc" }],
            "SpaceReclaimed": 73_400_320
        })))
        .mount(&server)
        .await;

    let report = client.prune_images().await.unwrap();
    assert_eq!(report.space_reclaimed, 73_400_320);
    assert_eq!(report.deleted_count(), 1);
}

#[tokio::test]
async fn test_prune_failure_surfaces_server_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/images/prune"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": "a prune operation is already running" })),
        )
        .mount(&server)
        .await;

    let err = client.prune_images().await.unwrap_err();
    assert!(
        matches!(err, Error::Action { ref message } if message == "a prune operation is already running"),
        "expected Action error, got: {err:?}"
    );
}

#[tokio::test]
async fn test_update_container_outcomes() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/update_container"))
        .and(body_json(json!({ "name": "web" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "container recreated with latest image",
            "updated": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/update_container"))
        .and(body_json(json!({ "name": "db" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "already up to date",
            "updated": false
        })))
        .mount(&server)
        .await;

    let web = client.update_container("web").await.unwrap();
    assert_eq!(web.outcome(), UpdateOutcome::Updated);
    let db = client.update_container("db").await.unwrap();
    assert_eq!(db.outcome(), UpdateOutcome::AlreadyUpToDate);
}

#[tokio::test]
async fn test_update_container_message_fallbacks() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/update_container"))
        .and(body_json(json!({ "name": "dockmon" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "self_update_blocked",
            "message": "cannot update itself"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/update_container"))
        .and(body_json(json!({ "name": "web" })))
        .respond_with(ResponseTemplate::new(502).set_body_string(""))
        .mount(&server)
        .await;

    let err = client.update_container("dockmon").await.unwrap_err();
    assert_eq!(err.to_string(), "self_update_blocked");
    let err = client.update_container("web").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502");
}

// ── Settings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_settings_round_trip_without_key() {
    let (server, client) = setup_with_key("k3y").await;

    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth_enabled": true,
            "api_key": "********",
            "allowed_cidrs": ["192.168.0.0/16"]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/settings"))
        .and(body_json(json!({
            "auth_enabled": true,
            "allowed_cidrs": ["192.168.0.0/16"],
            "generate_api_key": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "auth_enabled": true,
            "api_key": "fresh-key",
            "allowed_cidrs": ["192.168.0.0/16"]
        })))
        .mount(&server)
        .await;

    let current = client.get_settings().await.unwrap();
    assert!(current.key_is_masked());

    let saved = client
        .post_settings(&SettingsUpdate {
            auth_enabled: true,
            api_key: None,
            allowed_cidrs: current.allowed_cidrs.clone(),
            generate_api_key: true,
        })
        .await
        .unwrap();
    assert_eq!(saved.api_key, "fresh-key");

    for request in server.received_requests().await.unwrap() {
        assert_eq!(request.url.query(), None, "settings calls carry no key");
    }
}

#[tokio::test]
async fn test_health_probe() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "containers": ["web"] })),
        )
        .mount(&server)
        .await;

    let health = client.health().await.unwrap();
    assert!(health.ok);
    assert_eq!(health.containers, vec!["web".to_owned()]);
}
