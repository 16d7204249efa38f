//! Tests for the HTTP endpoints, served on a real listener

use super::*;
use crate::clock::{Clock, MockClock, SystemClock};
use crate::config::Config;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Running server plus the handles needed to stop it
struct TestServer {
    base: String,
    controller: ShutdownController,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start(config: Config, clock: Arc<dyn Clock>) -> Self {
        let config = Config { port: 0, ..config };
        let router = build_router(Arc::new(config.clone()), clock);
        let server = HealthServer::bind(config.port, router)
            .await
            .expect("Failed to bind test server");
        let base = format!("http://127.0.0.1:{}", server.local_addr().port());

        let (controller, signal) = shutdown_channel();
        let handle = tokio::spawn(server.serve(signal));

        Self {
            base,
            controller,
            handle,
        }
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = local_client()
            .get(format!("{}{}", self.base, path))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("Failed to connect to test server");
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.expect("Body should be JSON");
        (status, body)
    }

    async fn get_text(&self, path: &str) -> String {
        local_client()
            .get(format!("{}{}", self.base, path))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("Failed to connect to test server")
            .text()
            .await
            .expect("Failed to read body")
    }

    async fn stop(self) {
        self.controller.drain_and_stop();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("Server should stop after drain_and_stop")
            .expect("Server task should not panic");
        assert!(result.is_ok(), "Server should exit cleanly");
    }
}

fn config_with_secrets() -> Config {
    Config {
        database_url: Some("postgres://x".to_string()),
        api_key: Some("abc".to_string()),
        ..Config::default()
    }
}

fn fixed_clock() -> Arc<MockClock> {
    let time = Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 30, 45)
        .single()
        .expect("valid date")
        + chrono::Duration::milliseconds(7);
    Arc::new(MockClock::new(time))
}

fn assert_recent_timestamp(value: &Value) {
    let raw = value.as_str().expect("timestamp should be a string");
    assert_eq!(raw.len(), 24, "timestamp should be YYYY-MM-DDTHH:mm:ss.sssZ: {raw}");
    assert!(raw.ends_with('Z'), "timestamp should be UTC: {raw}");

    let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(raw)
        .expect("timestamp should be RFC 3339")
        .with_timezone(&Utc);
    let drift = (Utc::now() - parsed).num_milliseconds().abs();
    assert!(drift < 5_000, "timestamp {raw} is {drift}ms from now");
}

#[tokio::test]
async fn test_health_returns_200_with_timestamp() {
    let server = TestServer::start(Config::default(), Arc::new(SystemClock)).await;

    let (status, body) = server.get("/health").await;

    assert_eq!(status, 200, "Liveness probe should return 200");
    assert_eq!(body["status"], "healthy");
    assert_recent_timestamp(&body["timestamp"]);

    server.stop().await;
}

#[tokio::test]
async fn test_ready_returns_200_with_timestamp() {
    let server = TestServer::start(Config::default(), Arc::new(SystemClock)).await;

    let (status, body) = server.get("/ready").await;

    assert_eq!(status, 200, "Readiness probe should return 200");
    assert_eq!(body["status"], "ready");
    assert_recent_timestamp(&body["timestamp"]);

    server.stop().await;
}

#[tokio::test]
async fn test_timestamp_is_generated_per_response() {
    let clock = fixed_clock();
    let server = TestServer::start(Config::default(), clock.clone()).await;

    let (_, first) = server.get("/health").await;
    assert_eq!(first["timestamp"], "2024-06-01T12:30:45.007Z");

    clock.advance(chrono::Duration::seconds(2));
    let (_, second) = server.get("/health").await;
    assert_eq!(second["timestamp"], "2024-06-01T12:30:47.007Z");

    server.stop().await;
}

#[tokio::test]
async fn test_secrets_degraded_when_env_unset() {
    let server = TestServer::start(Config::default(), Arc::new(SystemClock)).await;

    let (status, body) = server.get("/api/health/secrets").await;

    assert_eq!(status, 200, "Secrets health is always 200");
    assert_eq!(
        body,
        json!({
            "databaseUrl": false,
            "apiKey": false,
            "status": "degraded",
            "message": "Some secrets are missing - running in demo mode"
        })
    );

    server.stop().await;
}

#[tokio::test]
async fn test_secrets_degraded_with_one_secret() {
    let config = Config {
        api_key: Some("abc".to_string()),
        ..Config::default()
    };
    let server = TestServer::start(config, Arc::new(SystemClock)).await;

    let (status, body) = server.get("/api/health/secrets").await;

    assert_eq!(status, 200);
    assert_eq!(body["databaseUrl"], false);
    assert_eq!(body["apiKey"], true);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["message"], DEGRADED_MESSAGE);

    server.stop().await;
}

#[tokio::test]
async fn test_secrets_healthy_when_both_present() {
    let server = TestServer::start(config_with_secrets(), Arc::new(SystemClock)).await;

    let (status, body) = server.get("/api/health/secrets").await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "databaseUrl": true,
            "apiKey": true,
            "status": "healthy"
        }),
        "Healthy response should carry no message"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_secret_values_never_echoed() {
    let config = Config {
        database_url: Some("postgres://user:hunter2@db:5432/app".to_string()),
        api_key: Some("sk-live-0123456789".to_string()),
        ..Config::default()
    };
    let server = TestServer::start(config, Arc::new(SystemClock)).await;

    for path in ["/", "/health", "/ready", "/api/health/secrets", "/api/status"] {
        let body = server.get_text(path).await;
        assert!(!body.contains("hunter2"), "{path} leaked DATABASE_URL");
        assert!(!body.contains("postgres://"), "{path} leaked DATABASE_URL");
        assert!(!body.contains("sk-live-0123456789"), "{path} leaked API_KEY");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_index_lists_endpoints_and_config() {
    let config = Config {
        env: "staging".to_string(),
        version: "4.5.6".to_string(),
        ..Config::default()
    };
    let server = TestServer::start(config, Arc::new(SystemClock)).await;

    let (status, body) = server.get("/").await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "name": "sample-app",
            "version": "4.5.6",
            "environment": "staging",
            "endpoints": {
                "health": "/health",
                "ready": "/ready",
                "secretsHealth": "/api/health/secrets",
                "status": "/api/status"
            }
        })
    );

    server.stop().await;
}

#[tokio::test]
async fn test_status_reports_has_secrets() {
    let clock = fixed_clock();
    let server = TestServer::start(config_with_secrets(), clock).await;

    let (status, body) = server.get("/api/status").await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "message": "Sample app is running",
            "timestamp": "2024-06-01T12:30:45.007Z",
            "environment": "development",
            "hasSecrets": true
        })
    );

    server.stop().await;
}

#[tokio::test]
async fn test_status_has_secrets_false_when_degraded() {
    let config = Config {
        database_url: Some("postgres://x".to_string()),
        ..Config::default()
    };
    let server = TestServer::start(config, Arc::new(SystemClock)).await;

    let (status, body) = server.get("/api/status").await;

    assert_eq!(status, 200);
    assert_eq!(body["hasSecrets"], false);
    assert_recent_timestamp(&body["timestamp"]);

    server.stop().await;
}

#[tokio::test]
async fn test_responses_are_json() {
    let server = TestServer::start(Config::default(), Arc::new(SystemClock)).await;

    let response = local_client()
        .get(format!("{}/health", server.base))
        .send()
        .await
        .expect("Failed to connect to test server");
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    assert_eq!(content_type, "application/json");

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_route_returns_404_json() {
    let server = TestServer::start(Config::default(), Arc::new(SystemClock)).await;

    let (status, body) = server.get("/does/not/exist").await;

    assert_eq!(status, 404);
    assert_eq!(body, json!({ "error": "Not found" }));

    server.stop().await;
}

/// Scenario: PORT=8080 with both secrets set binds 8080 and reports healthy
#[tokio::test]
async fn test_configured_port_is_bound() {
    let config = Config::from_lookup(|name: &str| match name {
        "DATABASE_URL" => Some("postgres://x".to_string()),
        "API_KEY" => Some("abc".to_string()),
        "PORT" => Some("18080".to_string()),
        _ => None,
    })
    .expect("config should resolve");

    let router = build_router(Arc::new(config.clone()), Arc::new(SystemClock));
    let server = HealthServer::bind(config.port, router)
        .await
        .expect("Failed to bind configured port");

    assert_eq!(server.local_addr().port(), 18080);
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("0.0.0.0:0")
        .await
        .expect("Failed to bind probe listener");
    let port = taken.local_addr().expect("local addr").port();

    let router = build_router(Arc::new(Config::default()), Arc::new(SystemClock));
    let result = HealthServer::bind(port, router).await;

    assert!(
        matches!(result, Err(ServerError::Bind { .. })),
        "Binding a taken port should fail"
    );
}

/// Client that never routes loopback traffic through a proxy
fn local_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client")
}
