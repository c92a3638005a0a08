//! Route definitions for `/staff` (accounts, subjects, assignments).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{staff, subject};
use crate::state::AppState;

/// Routes mounted at `/staff`.
///
/// ```text
/// GET    /                              -> list_staff (admin)
/// POST   /                              -> create_staff (admin)
/// GET    /{id}                          -> get_staff (admin)
/// PUT    /{id}                          -> update_staff (admin)
/// DELETE /{id}                          -> deactivate_staff (admin)
/// GET    /subjects                      -> list_subjects
/// POST   /subjects                      -> create_subject (admin)
/// GET    /subjects/{id}                 -> get_subject
/// PUT    /subjects/{id}                 -> update_subject (admin)
/// DELETE /subjects/{id}                 -> delete_subject (admin)
/// GET    /{id}/subjects                 -> list_staff_subjects
/// POST   /{id}/subjects/{subject_id}    -> assign_subject (admin)
/// DELETE /{id}/subjects/{subject_id}    -> unassign_subject (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(staff::list_staff).post(staff::create_staff))
        .route(
            "/subjects",
            get(subject::list_subjects).post(subject::create_subject),
        )
        .route(
            "/subjects/{id}",
            get(subject::get_subject)
                .put(subject::update_subject)
                .delete(subject::delete_subject),
        )
        .route(
            "/{id}",
            get(staff::get_staff)
                .put(staff::update_staff)
                .delete(staff::deactivate_staff),
        )
        .route("/{id}/subjects", get(subject::list_staff_subjects))
        .route(
            "/{id}/subjects/{subject_id}",
            post(subject::assign_subject).delete(subject::unassign_subject),
        )
}
