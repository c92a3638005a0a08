use std::sync::Arc;

use schoolhub_notify::NotificationDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: schoolhub_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Email + WhatsApp dispatcher with its templates and transports.
    pub dispatcher: Arc<NotificationDispatcher>,
}
