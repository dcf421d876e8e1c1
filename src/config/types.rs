// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::fmt;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which persistence backend to construct at startup
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Mongodb,
    Memory,
}

/// Document database connection settings
#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub user: Option<String>,
    pub password: Option<String>,
    pub cluster_host: String,
    /// Database name
    pub name: String,
    pub app_name: String,
    /// Full connection string, overrides the assembled one
    pub uri: Option<String>,
}

impl DatabaseConfig {
    /// Connection string for the driver.
    ///
    /// Credentials are percent-encoded into the `mongodb+srv` URI so that
    /// passwords containing `@`, `:` or `/` survive parsing.
    pub fn connection_uri(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }

        let credentials = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            _ => String::new(),
        };

        format!(
            "mongodb+srv://{credentials}{}/?retryWrites=true&w=majority&appName={}",
            self.cluster_host, self.app_name
        )
    }
}

// Keeps the password out of startup logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("cluster_host", &self.cluster_host)
            .field("name", &self.name)
            .field("app_name", &self.app_name)
            .field("uri", &self.uri.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format: `combined`, `common` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}
