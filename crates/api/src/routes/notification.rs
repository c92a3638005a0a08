//! Route definitions for `/notification`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notification`.
///
/// ```text
/// POST   /attendance      -> send_attendance
/// POST   /test-scores     -> send_test_scores
/// GET    /history         -> list_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendance", post(notification::send_attendance))
        .route("/test-scores", post(notification::send_test_scores))
        .route("/history", get(notification::list_history))
}
