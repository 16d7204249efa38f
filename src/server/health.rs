//! Health, readiness, secrets and status endpoints
//!
//! - `/health` - Liveness: Is the process alive?
//! - `/ready` - Readiness: Can the service take traffic?
//! - `/api/health/secrets` - Are the external secrets loaded?
//! - `/` - Service info and endpoint index
//! - `/api/status` - Running status and secrets summary
//!
//! All bodies are JSON. Timestamps come from the injected `Clock`.

use crate::clock::{iso8601, Clock};
use crate::config::Config;
use crate::server::error::{handle_panic, ErrorBody};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::warn;

pub const HEALTH_PATH: &str = "/health";
pub const READY_PATH: &str = "/ready";
pub const SECRETS_HEALTH_PATH: &str = "/api/health/secrets";
pub const STATUS_PATH: &str = "/api/status";

pub const DEGRADED_MESSAGE: &str = "Some secrets are missing - running in demo mode";
pub const STATUS_MESSAGE: &str = "Sample app is running";

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    fn timestamp(&self) -> String {
        iso8601(self.clock.now())
    }
}

#[derive(Debug, Serialize)]
struct ProbeResponse {
    status: &'static str,
    timestamp: String,
}

/// Presence flags only, never the secret values
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretsHealth {
    database_url: bool,
    api_key: bool,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Endpoints {
    health: &'static str,
    ready: &'static str,
    secrets_health: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    name: String,
    version: String,
    environment: String,
    endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    message: &'static str,
    timestamp: String,
    environment: String,
    has_secrets: bool,
}

/// Liveness probe handler
async fn health(State(state): State<AppState>) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "healthy",
        timestamp: state.timestamp(),
    })
}

/// Readiness probe handler
async fn ready(State(state): State<AppState>) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "ready",
        timestamp: state.timestamp(),
    })
}

/// Secrets health handler
///
/// Always 200; a missing secret downgrades `status` to `degraded`.
async fn secrets_health(State(state): State<AppState>) -> Json<SecretsHealth> {
    let database_url = state.config.has_database_url();
    let api_key = state.config.has_api_key();

    if database_url && api_key {
        return Json(SecretsHealth {
            database_url,
            api_key,
            status: "healthy",
            message: None,
        });
    }

    warn!(database_url, api_key, "External secrets not fully loaded");
    Json(SecretsHealth {
        database_url,
        api_key,
        status: "degraded",
        message: Some(DEGRADED_MESSAGE),
    })
}

/// Service info handler
async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: state.config.app_name.clone(),
        version: state.config.version.clone(),
        environment: state.config.env.clone(),
        endpoints: Endpoints {
            health: HEALTH_PATH,
            ready: READY_PATH,
            secrets_health: SECRETS_HEALTH_PATH,
            status: STATUS_PATH,
        },
    })
}

/// Status handler
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: STATUS_MESSAGE,
        timestamp: state.timestamp(),
        environment: state.config.env.clone(),
        has_secrets: state.config.has_secrets(),
    })
}

/// Fallback for unmatched routes
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody { error: "Not found" }))
}

/// Build the router for all service endpoints
///
/// Panics raised inside any handler are turned into a 500 with a generic body.
pub fn build_router(config: Arc<Config>, clock: Arc<dyn Clock>) -> Router {
    let state = AppState::new(config, clock);

    Router::new()
        .route("/", get(index))
        .route(HEALTH_PATH, get(health))
        .route(READY_PATH, get(ready))
        .route(SECRETS_HEALTH_PATH, get(secrets_health))
        .route(STATUS_PATH, get(status))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
}
