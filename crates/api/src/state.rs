use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. Each request opens one transaction on it.
    pub pool: stockroom_db::DbPool,
    pub config: Arc<ServerConfig>,
}
