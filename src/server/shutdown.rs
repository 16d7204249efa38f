//! Graceful shutdown handling
//!
//! Handles SIGTERM and SIGINT signals for clean shutdown:
//! - Stops accepting new connections
//! - Waits for in-flight requests to complete
//! - Returns so the process can exit with success

use super::error::ServerError;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Receiving half of the shutdown channel
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                // Sender dropped, treat as shutdown
                break;
            }
        }
    }

    /// Check if shutdown was signaled (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Controller for triggering shutdown
pub struct ShutdownController {
    sender: watch::Sender<bool>,
}

impl ShutdownController {
    /// Move the server from running to draining
    ///
    /// New connections are refused from here on; in-flight requests finish.
    pub fn drain_and_stop(&self) {
        if self.sender.send_replace(true) {
            return;
        }
        info!("Shutdown signal received, closing server gracefully");
    }
}

/// Create a new shutdown signal pair
///
/// Returns (controller, signal) where:
/// - controller: Used to trigger shutdown
/// - signal: Handed to the server that needs to drain
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownController { sender }, ShutdownSignal { receiver })
}

/// HTTP server that owns its bound listener
///
/// Binding and serving are split so a bind failure surfaces before anything
/// else starts, and so tests can read the ephemeral port.
pub struct HealthServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl HealthServer {
    /// Bind the listener on all interfaces
    pub async fn bind(port: u16, router: Router) -> Result<Self, ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Self::from_listener(listener, router)
    }

    /// Wrap an already bound listener
    pub fn from_listener(listener: TcpListener, router: Router) -> Result<Self, ServerError> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` fires, then drain
    ///
    /// Returns only after every in-flight connection has completed.
    pub async fn serve(self, mut shutdown: ShutdownSignal) -> Result<(), ServerError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        info!("Server closed");
        Ok(())
    }
}

/// Wait for SIGTERM or SIGINT signal
///
/// Returns the signal name that was received.
///
/// # Panics
/// Panics if signal handlers cannot be registered (OS resource exhaustion).
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::error;

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to register SIGTERM handler");
            panic!("Cannot register SIGTERM handler: {}", e);
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to register SIGINT handler");
            panic!("Cannot register SIGINT handler: {}", e);
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
            "SIGTERM"
        }
        _ = sigint.recv() => {
            info!("Received SIGINT");
            "SIGINT"
        }
    }
}

/// Wait for Ctrl+C signal (Windows)
///
/// # Panics
/// Panics if Ctrl+C handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    use tracing::error;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
        panic!("Cannot wait for Ctrl+C: {}", e);
    }
    info!("Received Ctrl+C");
    "CTRL_C"
}
