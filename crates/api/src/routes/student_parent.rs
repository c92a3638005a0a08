//! Route definitions for `/student-and-parent`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{data_change, student_parent};
use crate::state::AppState;

/// Routes mounted at `/student-and-parent`.
///
/// ```text
/// GET    /                                    -> list_student_parents
/// POST   /                                    -> create_student_parent (admin)
/// POST   /import                              -> import_student_parents (admin)
/// GET    /template                            -> download_template (public)
/// POST   /data-change-requests                -> submit_change_request (public)
/// GET    /data-change-requests                -> list_change_requests
/// POST   /data-change-requests/{id}/approve   -> approve_change_request (admin)
/// POST   /data-change-requests/{id}/reject    -> reject_change_request (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(student_parent::list_student_parents).post(student_parent::create_student_parent),
        )
        .route("/import", post(student_parent::import_student_parents))
        .route("/template", get(student_parent::download_template))
        .route(
            "/data-change-requests",
            get(data_change::list_change_requests).post(data_change::submit_change_request),
        )
        .route(
            "/data-change-requests/{id}/approve",
            post(data_change::approve_change_request),
        )
        .route(
            "/data-change-requests/{id}/reject",
            post(data_change::reject_change_request),
        )
}
