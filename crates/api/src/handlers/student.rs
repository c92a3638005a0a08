//! Handlers for the `/student` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_core::gender::Gender;
use schoolhub_core::phone::validate_telephone;
use schoolhub_core::student_import::validate_grade_label;
use schoolhub_core::types::DbId;
use schoolhub_db::models::student::{Student, StudentFilter, StudentWithParent, UpdateStudent};
use schoolhub_db::repositories::StudentRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/student?grade=&grade_label=
pub async fn list_students(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<StudentFilter>,
) -> AppResult<Json<ApiResponse<Vec<Student>>>> {
    let students = StudentRepo::list(&state.pool, &filter).await?;
    Ok(ApiResponse::ok("Students retrieved", students))
}

/// GET /api/v1/student/{id}
///
/// The student joined with their parent.
pub async fn get_student(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<StudentWithParent>>> {
    let student = StudentRepo::find_with_parent(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Student", id }))?;
    Ok(ApiResponse::ok("Student retrieved", student))
}

/// PUT /api/v1/student/{id}
///
/// Partial update of the student's own fields. The parent is changed through
/// data-change requests, never here.
pub async fn update_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStudent>,
) -> AppResult<Json<ApiResponse<Student>>> {
    let current = StudentRepo::find_with_parent(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Student", id }))?;

    let input = normalize_update(input)?;

    if let Some(telephone) = &input.telephone {
        if *telephone == current.parent_telephone {
            return Err(AppError::Core(CoreError::Validation(
                "student telephone must differ from the parent telephone".into(),
            )));
        }
        if *telephone != current.telephone
            && StudentRepo::telephone_taken(&state.pool, telephone, id).await?
        {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "telephone '{telephone}' is already registered"
            ))));
        }
    }

    let student = StudentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Student", id }))?;
    Ok(ApiResponse::ok("Student updated", student))
}

/// DELETE /api/v1/student/{id}
///
/// Soft-delete the student. A parent left without students is soft-deleted
/// with them.
pub async fn delete_student(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !StudentRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Student", id }));
    }
    tracing::info!(student_id = id, deleted_by = admin.staff_id, "Student deleted");
    Ok(ApiResponse::ok("Student deleted", ()))
}

/// Trim and check every provided field; gender is rewritten to its column value.
fn normalize_update(input: UpdateStudent) -> AppResult<UpdateStudent> {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
    let update = UpdateStudent {
        nsn: trim(input.nsn),
        name: trim(input.name),
        grade: input.grade,
        grade_label: trim(input.grade_label).map(|l| l.to_uppercase()),
        gender: input
            .gender
            .map(|g| g.parse::<Gender>().map(|g| g.as_str().to_string()))
            .transpose()
            .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?,
        telephone: trim(input.telephone),
    };

    let invalid = |msg: String| Err(AppError::Core(CoreError::Validation(msg)));

    if update.name.as_deref().is_some_and(str::is_empty) {
        return invalid("student name must not be empty".into());
    }
    if update.nsn.as_deref().is_some_and(str::is_empty) {
        return invalid("nsn must not be empty".into());
    }
    if update.grade.is_some_and(|g| g < 1) {
        return invalid("grade must be at least 1".into());
    }
    if let Some(label) = &update.grade_label {
        validate_grade_label(label).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    if let Some(telephone) = &update.telephone {
        validate_telephone(telephone).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn update_is_trimmed_and_gender_normalized() {
        let update = normalize_update(UpdateStudent {
            name: Some("  Andi ".into()),
            grade_label: Some(" b ".into()),
            gender: Some("FEMALE".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Andi"));
        assert_eq!(update.grade_label.as_deref(), Some("B"));
        assert_eq!(update.gender.as_deref(), Some("female"));
    }

    #[test]
    fn update_rejects_bad_fields() {
        assert_matches!(
            normalize_update(UpdateStudent {
                grade: Some(0),
                ..Default::default()
            }),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            normalize_update(UpdateStudent {
                grade_label: Some("7A".into()),
                ..Default::default()
            }),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            normalize_update(UpdateStudent {
                grade_label: Some("ä".into()),
                ..Default::default()
            }),
            Err(AppError::Core(CoreError::Validation(msg))) if msg.contains("letters only")
        );
        assert_matches!(
            normalize_update(UpdateStudent {
                telephone: Some("08-12".into()),
                ..Default::default()
            }),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            normalize_update(UpdateStudent {
                gender: Some("other".into()),
                ..Default::default()
            }),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }
}
