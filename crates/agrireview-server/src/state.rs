//! Shared application state.

use agrireview_core::AppConfig;
use agrireview_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: SqliteStore,
}

impl AppState {
    pub fn new(config: AppConfig, store: SqliteStore) -> Self {
        Self { config, store }
    }
}
