//! HTTP server for health and status endpoints
//!
//! Provides the probe endpoints used by the deployment pipeline:
//! - `/health` - Liveness probe (process is running)
//! - `/ready` - Readiness probe (service can take traffic)
//! - `/api/health/secrets` - External secrets presence
//!
//! Also provides graceful shutdown handling for SIGTERM/SIGINT.

pub mod error;
mod health;
pub mod shutdown;

pub use error::{ApiError, ServerError};
pub use health::{
    build_router, AppState, DEGRADED_MESSAGE, HEALTH_PATH, READY_PATH, SECRETS_HEALTH_PATH,
    STATUS_PATH,
};
pub use shutdown::{shutdown_channel, wait_for_signal, HealthServer, ShutdownController, ShutdownSignal};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;

#[cfg(test)]
#[path = "error_test.rs"]
mod error_tests;
