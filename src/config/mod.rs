// Configuration module entry point
// Layered settings (defaults, config file, environment) and shared runtime state

mod state;
mod types;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, DatabaseBackend, DatabaseConfig};

/// Prefix for structured environment overrides, e.g. `APP__HTTP__ENABLE_CORS=false`
const ENV_PREFIX: &str = "APP";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence, lowest first: built-in defaults, the config file,
    /// `APP__*` variables, then the plain `PORT`, `DB_USER` and `DB_PASS`
    /// variables used by existing deployments.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("server.port", env_var("PORT"))?
            .set_override_option("database.user", env_var("DB_USER"))?
            .set_override_option("database.password", env_var("DB_PASS"))?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("database.backend", "mongodb")?
        .set_default("database.cluster_host", "cluster0.yhwb0.mongodb.net")?
        .set_default("database.name", "college")?
        .set_default("database.app_name", "Cluster0")?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("http.server_name", "college-admission-api")?
        .set_default("http.enable_cors", true)?
        .set_default("http.max_body_size", 1_048_576) // 1MB
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
impl Config {
    /// Built-in defaults with the in-memory backend
    pub fn in_memory() -> Self {
        with_defaults(config::Config::builder())
            .and_then(|b| b.set_override("database.backend", "memory"))
            .and_then(|b| b.build())
            .and_then(config::Config::try_deserialize)
            .unwrap()
    }
}
