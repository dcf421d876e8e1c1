// Application state module
// Holds the loaded configuration and the persistence handle shared by every request

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::store::DocumentStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: config.clone(),
            store,
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }
}
