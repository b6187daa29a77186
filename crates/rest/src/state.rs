//! Application state shared across request handlers.

use std::sync::Arc;

use basketapp_storage::ElassandraStorage;

use crate::config::ServerConfig;

/// Shared application state.
///
/// Cloned per request by Axum; both fields are reference-counted so the
/// clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The storage context.
    pub storage: Arc<ElassandraStorage>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates new application state.
    pub fn new(storage: Arc<ElassandraStorage>, config: Arc<ServerConfig>) -> Self {
        Self { storage, config }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.storage)
            .field("bind_addr", &self.config.bind_addr())
            .finish()
    }
}
