//! Handlers for subjects and teacher assignments.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_core::types::DbId;
use schoolhub_db::models::subject::{CreateSubject, Subject, UpdateSubject};
use schoolhub_db::repositories::{StaffRepo, SubjectRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Result of an assign/unassign call.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub staff_id: DbId,
    pub subject_id: DbId,
    /// `false` when the call was a no-op.
    pub changed: bool,
}

/// POST /api/v1/staff/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateSubject>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subject>>)> {
    let input = CreateSubject {
        code: input.code.trim().to_uppercase(),
        name: input.name.trim().to_string(),
        grade: input.grade,
    };
    if input.code.is_empty() || input.name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "code and name are required".into(),
        )));
    }
    validate_grade(input.grade)?;

    let subject = SubjectRepo::create(&state.pool, &input).await?;
    Ok(ApiResponse::created("Subject created", subject))
}

/// GET /api/v1/staff/subjects
pub async fn list_subjects(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Subject>>>> {
    let subjects = SubjectRepo::list(&state.pool).await?;
    Ok(ApiResponse::ok("Subjects retrieved", subjects))
}

/// GET /api/v1/staff/subjects/{id}
pub async fn get_subject(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Subject>>> {
    let subject = SubjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Subject", id }))?;
    Ok(ApiResponse::ok("Subject retrieved", subject))
}

/// PUT /api/v1/staff/subjects/{id}
pub async fn update_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSubject>,
) -> AppResult<Json<ApiResponse<Subject>>> {
    let input = UpdateSubject {
        code: input.code.map(|c| c.trim().to_uppercase()),
        name: input.name.map(|n| n.trim().to_string()),
        grade: input.grade,
    };
    if input.code.as_deref().is_some_and(str::is_empty)
        || input.name.as_deref().is_some_and(str::is_empty)
    {
        return Err(AppError::Core(CoreError::Validation(
            "code and name must not be empty".into(),
        )));
    }
    if let Some(grade) = input.grade {
        validate_grade(grade)?;
    }

    let subject = SubjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Subject", id }))?;
    Ok(ApiResponse::ok("Subject updated", subject))
}

/// DELETE /api/v1/staff/subjects/{id}
pub async fn delete_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !SubjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Subject", id }));
    }
    Ok(ApiResponse::ok("Subject deleted", ()))
}

/// GET /api/v1/staff/{id}/subjects
pub async fn list_staff_subjects(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(staff_id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Vec<Subject>>>> {
    ensure_staff_exists(&state, staff_id).await?;
    let subjects = SubjectRepo::list_for_staff(&state.pool, staff_id).await?;
    Ok(ApiResponse::ok("Subjects retrieved", subjects))
}

/// POST /api/v1/staff/{id}/subjects/{subject_id}
pub async fn assign_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((staff_id, subject_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<ApiResponse<AssignmentResponse>>> {
    ensure_staff_exists(&state, staff_id).await?;
    SubjectRepo::find_by_id(&state.pool, subject_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Subject",
            id: subject_id,
        }))?;

    let changed = SubjectRepo::assign(&state.pool, staff_id, subject_id).await?;
    let message = if changed {
        "Subject assigned"
    } else {
        "Subject already assigned"
    };
    Ok(ApiResponse::ok(
        message,
        AssignmentResponse {
            staff_id,
            subject_id,
            changed,
        },
    ))
}

/// DELETE /api/v1/staff/{id}/subjects/{subject_id}
pub async fn unassign_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((staff_id, subject_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<ApiResponse<AssignmentResponse>>> {
    let changed = SubjectRepo::unassign(&state.pool, staff_id, subject_id).await?;
    if !changed {
        return Err(AppError::Core(CoreError::NotFoundBy {
            entity: "Assignment",
            key: format!("staff {staff_id} and subject {subject_id}"),
        }));
    }
    Ok(ApiResponse::ok(
        "Subject unassigned",
        AssignmentResponse {
            staff_id,
            subject_id,
            changed,
        },
    ))
}

async fn ensure_staff_exists(state: &AppState, id: DbId) -> AppResult<()> {
    StaffRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Staff", id }))?;
    Ok(())
}

fn validate_grade(grade: i32) -> AppResult<()> {
    if grade < 1 {
        return Err(AppError::Core(CoreError::Validation(
            "grade must be at least 1".into(),
        )));
    }
    Ok(())
}
