//! Logger module
//!
//! Thin wrappers over `tracing` so call sites stay one-liners:
//! - Server lifecycle logging
//! - Access logging in combined, common or JSON format
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

/// Target used for access log lines, filterable with `RUST_LOG=access=off`
const ACCESS_TARGET: &str = "access";

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
/// Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;

    fmt().with_env_filter(filter).with_target(false).try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("College admission API started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!(
        "Database: {} ({:?} backend)",
        config.database.name,
        config.database.backend
    );
    tracing::info!("Max body size: {} bytes", config.http.max_body_size);
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_info(message: &str) {
    tracing::info!("{message}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log a failed database call together with the fixed message the client saw
pub fn log_store_error(context: &str, err: &impl std::fmt::Display) {
    tracing::error!("{context}: {err}");
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    tracing::debug!("[API] {method} {path} - {status}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("{signal} received, shutting down gracefully");
}

pub fn log_shutdown_complete() {
    tracing::info!("Server stopped");
}
