//! Handlers for `/notification`: attendance and test-score dispatch, and the
//! delivery history.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use schoolhub_core::error::CoreError;
use schoolhub_core::notification::NotificationKind;
use schoolhub_core::types::DbId;
use schoolhub_db::models::notification_history::{HistoryFilter, NotificationHistory};
use schoolhub_db::repositories::NotificationHistoryRepo;
use schoolhub_notify::dispatcher::{DispatchRequest, SubjectRef};
use schoolhub_notify::DispatchReport;
use serde::Deserialize;

use super::{authorize_subject, score_scope};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body shared by both dispatch endpoints.
#[derive(Debug, Deserialize)]
pub struct DispatchBody {
    pub subject_id: DbId,
    pub student_ids: Vec<DbId>,
    /// Lesson or test date; defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub student_id: Option<DbId>,
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/v1/notification/attendance
pub async fn send_attendance(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<DispatchBody>,
) -> AppResult<Json<ApiResponse<DispatchReport>>> {
    dispatch(state, user, body, NotificationKind::Attendance).await
}

/// POST /api/v1/notification/test-scores
///
/// Sends each student's pending score; sent scores are cleared afterwards.
/// Teachers send the scores they recorded, admins the latest pending score
/// of any teacher.
pub async fn send_test_scores(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<DispatchBody>,
) -> AppResult<Json<ApiResponse<DispatchReport>>> {
    dispatch(state, user, body, NotificationKind::TestScore).await
}

/// GET /api/v1/notification/history?student_id=&kind=&limit=&offset=
pub async fn list_history(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<ApiResponse<Vec<NotificationHistory>>>> {
    if let Some(kind) = &query.kind {
        let known = [
            NotificationKind::Attendance.as_str(),
            NotificationKind::TestScore.as_str(),
        ];
        if !known.contains(&kind.as_str()) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid kind '{kind}'. Must be one of: {}",
                known.join(", ")
            ))));
        }
    }

    let page = PaginationParams {
        limit: query.limit,
        offset: query.offset,
    };
    let filter = HistoryFilter {
        student_id: query.student_id,
        kind: query.kind,
    };
    let rows =
        NotificationHistoryRepo::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    Ok(ApiResponse::ok("Notification history retrieved", rows))
}

async fn dispatch(
    state: AppState,
    user: AuthUser,
    body: DispatchBody,
    kind: NotificationKind,
) -> AppResult<Json<ApiResponse<DispatchReport>>> {
    if body.student_ids.is_empty() {
        return Err(AppError::BadRequest("student_ids must not be empty".into()));
    }
    let subject = authorize_subject(&state, &user, body.subject_id).await?;
    let subject = SubjectRef {
        id: subject.id,
        name: subject.name,
    };
    let request = DispatchRequest {
        staff_id: user.staff_id,
        recorded_by: score_scope(&user),
        subject: &subject,
        student_ids: &body.student_ids,
        date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
    };

    let report = match kind {
        NotificationKind::Attendance => state.dispatcher.dispatch_attendance(request).await,
        NotificationKind::TestScore => state.dispatcher.dispatch_scores(request).await,
    };

    if report.all_failed() {
        tracing::warn!(
            kind = kind.as_str(),
            subject_id = subject.id,
            requested = report.requested,
            "Every notification recipient failed",
        );
        return Err(AppError::DeliveryFailed(report.errors));
    }

    let message = if report.errors.is_empty() {
        "Notifications sent"
    } else {
        "Notifications sent with errors"
    };
    Ok(ApiResponse::ok(message, report))
}
