// Delivery client tests: status derivation table, full cycle against a
// loopback RPC server, transport failure as NoResponse

mod common;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use healthmon::config::DeliveryConfig;
use healthmon::delivery::{DeliveryClient, Outcome, derive_status_message};
use serde_json::json;

fn delivery_config(rpc_url: &str) -> DeliveryConfig {
    DeliveryConfig {
        rpc_url: rpc_url.into(),
        auth_token: "test-token".into(),
        service_id: "svc42".into(),
        request_timeout_secs: 5,
    }
}

#[test]
fn test_derive_status_no_alerts() {
    let outcome = Outcome::Response {
        status: 200,
        body: r#"{"result":{"alerts":[]}}"#.into(),
    };
    assert_eq!(derive_status_message(&outcome), "No alerts detected");
}

#[test]
fn test_derive_status_counts_alerts() {
    let outcome = Outcome::Response {
        status: 200,
        body: r#"{"result":{"alerts":[1,2]}}"#.into(),
    };
    assert_eq!(derive_status_message(&outcome), "Alerts detected: 2");
}

#[test]
fn test_derive_status_unknown_on_non_200() {
    let outcome = Outcome::Response {
        status: 500,
        body: r#"{"result":{"alerts":[]}}"#.into(),
    };
    assert_eq!(derive_status_message(&outcome), "Alert status unknown");
}

#[test]
fn test_derive_status_unknown_on_no_response() {
    let outcome = Outcome::NoResponse {
        reason: "connection refused".into(),
    };
    assert_eq!(derive_status_message(&outcome), "Alert status unknown");
}

#[test]
fn test_derive_status_unknown_on_malformed_body() {
    let outcome = Outcome::Response {
        status: 200,
        body: "definitely not json".into(),
    };
    assert_eq!(derive_status_message(&outcome), "Alert status unknown");

    let outcome = Outcome::Response {
        status: 200,
        body: r#"{"result":{"alerts":"not-a-list"}}"#.into(),
    };
    assert_eq!(derive_status_message(&outcome), "Alert status unknown");
}

#[test]
fn test_outcome_is_ok_on_2xx_only() {
    let ok = Outcome::Response {
        status: 200,
        body: String::new(),
    };
    assert!(ok.is_ok());
    let server_error = Outcome::Response {
        status: 500,
        body: String::new(),
    };
    assert!(!server_error.is_ok());
    let no_response = Outcome::NoResponse {
        reason: "timeout".into(),
    };
    assert!(!no_response.is_ok());
}

/// Loopback RPC endpoint: checks the token header, answers service.alerts
/// with two alerts, and echoes the request payload back for inspection.
async fn spawn_rpc_server() -> std::net::SocketAddr {
    let app = Router::new().route(
        "/rpc",
        post(
            |headers: HeaderMap, Json(payload): Json<serde_json::Value>| async move {
                if headers.get("token").and_then(|v| v.to_str().ok()) != Some("test-token") {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": "bad token"})),
                    );
                }
                let method = payload.get("method").and_then(|m| m.as_str()).unwrap_or("");
                let body = match method {
                    "service.alerts" => json!({"result": {"alerts": [1, 2]}}),
                    _ => json!({"result": "ok", "echo": payload}),
                };
                (StatusCode::OK, Json(body))
            },
        ),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_cycle_runs_all_three_calls_in_order() {
    let addr = spawn_rpc_server().await;
    let client = DeliveryClient::new(&delivery_config(&format!("http://{}/rpc", addr))).unwrap();

    let snapshot = common::sample_snapshot(1000);
    let alerts = vec!["No alerts detected".to_string()];
    let report = client.cycle(&snapshot, &alerts, vec![]).await;

    assert!(report.health.is_ok());
    assert!(report.alerts.is_ok());
    assert!(report.notify.is_ok());
    // The loopback server reports two alerts
    assert_eq!(derive_status_message(&report.alerts), "Alerts detected: 2");
}

#[tokio::test]
async fn test_send_health_stamps_service_id_and_wraps_rpc_envelope() {
    let addr = spawn_rpc_server().await;
    let client = DeliveryClient::new(&delivery_config(&format!("http://{}/rpc", addr))).unwrap();

    let snapshot = common::sample_snapshot(1000);
    let outcome = client
        .send_health(&snapshot, &["No alerts detected".to_string()], vec![])
        .await;

    let Outcome::Response { status, body } = outcome else {
        panic!("expected a response");
    };
    assert_eq!(status, 200);
    let echoed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let request = &echoed["echo"];
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "service.health");
    assert_eq!(request["params"]["service"], "svc42");
    assert_eq!(request["params"]["id"], "w1");
    assert_eq!(request["params"]["alerts"][0], "No alerts detected");
    assert!(request["params"]["health"]["memory"].is_object());
}

#[tokio::test]
async fn test_notification_carries_message_and_default_tags() {
    let addr = spawn_rpc_server().await;
    let client = DeliveryClient::new(&delivery_config(&format!("http://{}/rpc", addr))).unwrap();

    let outcome = client.send_notification("Alert status unknown", None).await;
    let Outcome::Response { body, .. } = outcome else {
        panic!("expected a response");
    };
    let echoed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let request = &echoed["echo"];
    assert_eq!(request["method"], "service.notify");
    assert_eq!(request["params"]["msg"], "Alert status unknown");
    assert_eq!(request["params"]["tags"], json!(["health", "monitoring"]));
}

#[tokio::test]
async fn test_transport_failure_is_no_response_sentinel() {
    // Bind then drop to get a port that refuses connections
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = DeliveryClient::new(&delivery_config(&format!("http://{}/rpc", addr))).unwrap();
    let outcome = client.fetch_alerts().await;
    assert!(matches!(outcome, Outcome::NoResponse { .. }));
    assert_eq!(derive_status_message(&outcome), "Alert status unknown");
}
