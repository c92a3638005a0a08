//! Route definitions for `/sender`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sender;
use crate::state::AppState;

/// Routes mounted at `/sender`.
///
/// ```text
/// GET    /                -> sender_status
/// POST   /test-whatsapp   -> test_whatsapp (admin)
/// POST   /test-email      -> test_email (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sender::sender_status))
        .route("/test-whatsapp", post(sender::test_whatsapp))
        .route("/test-email", post(sender::test_email))
}
