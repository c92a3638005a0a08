pub mod auth;
pub mod health;
pub mod notification;
pub mod sender;
pub mod staff;
pub mod student;
pub mod student_parent;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /login                                              login (public)
/// /login/me                                           current profile
///
/// /staff                                              list, create (admin)
/// /staff/{id}                                         get, update, deactivate (admin)
/// /staff/subjects                                     list, create
/// /staff/subjects/{id}                                get, update, delete
/// /staff/{id}/subjects                                subjects taught by staff
/// /staff/{id}/subjects/{subject_id}                   assign, unassign (admin)
///
/// /student                                            list (?grade, grade_label)
/// /student/{id}                                       get, update, delete
/// /student/test-scores                                list (?subject_id), record
///
/// /student-and-parent                                 list, create
/// /student-and-parent/import                          CSV import (multipart)
/// /student-and-parent/template                        CSV template (public)
/// /student-and-parent/data-change-requests            submit (public), list
/// /student-and-parent/data-change-requests/{id}/approve
/// /student-and-parent/data-change-requests/{id}/reject
///
/// /notification/attendance                            attendance dispatch
/// /notification/test-scores                           score dispatch
/// /notification/history                               history (?student_id, kind, limit, offset)
///
/// /sender                                             channel status
/// /sender/test-whatsapp                               test WhatsApp send (admin)
/// /sender/test-email                                  test email send (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/login", auth::router())
        .nest("/staff", staff::router())
        .nest("/student", student::router())
        .nest("/student-and-parent", student_parent::router())
        .nest("/notification", notification::router())
        .nest("/sender", sender::router())
}
