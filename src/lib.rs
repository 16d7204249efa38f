//! sample-app: a minimal health/readiness/status HTTP service
//!
//! Configuration is resolved once from the environment, handed to the router
//! as an immutable value, and the server drains in-flight requests on
//! SIGTERM/SIGINT before the process exits.

pub mod clock;
pub mod config;
pub mod server;
