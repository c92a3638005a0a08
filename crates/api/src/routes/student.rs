//! Route definitions for `/student`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{student, test_score};
use crate::state::AppState;

/// Routes mounted at `/student`.
///
/// ```text
/// GET    /                -> list_students
/// GET    /test-scores     -> list_scores (?subject_id)
/// POST   /test-scores     -> record_scores
/// GET    /{id}            -> get_student
/// PUT    /{id}            -> update_student (admin)
/// DELETE /{id}            -> delete_student (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(student::list_students))
        .route(
            "/test-scores",
            get(test_score::list_scores).post(test_score::record_scores),
        )
        .route(
            "/{id}",
            get(student::get_student)
                .put(student::update_student)
                .delete(student::delete_student),
        )
}
