//! Handlers for `/student-and-parent`: joined listing, single create with
//! parent matching, CSV bulk import, and the CSV template.

use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_core::parent_match::normalize_name;
use schoolhub_core::student_import::{
    csv_template, parse_upload, validate_batch, validate_single, ExistingRecords, SkippedRow,
    StudentParentInput,
};
use schoolhub_db::models::student::{CreatedStudent, StudentFilter, StudentWithParent};
use schoolhub_db::repositories::{StudentParentRepo, StudentRepo};
use schoolhub_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Multipart field carrying the CSV document.
const UPLOAD_FIELD: &str = "file";

/// Result of a successful import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created: usize,
    /// Rows dropped before validation (blank or wrong column count).
    pub skipped: Vec<SkippedRow>,
    pub students: Vec<CreatedStudent>,
}

/// GET /api/v1/student-and-parent?grade=&grade_label=
pub async fn list_student_parents(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<StudentFilter>,
) -> AppResult<Json<ApiResponse<Vec<StudentWithParent>>>> {
    let rows = StudentRepo::list_with_parent(&state.pool, &filter).await?;
    Ok(ApiResponse::ok("Students retrieved", rows))
}

/// POST /api/v1/student-and-parent
///
/// Create one student. The parent is attached to an existing parent row when
/// telephone, email, or name matches; otherwise a new parent is created.
pub async fn create_student_parent(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<StudentParentInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedStudent>>)> {
    let input = input.normalized();
    let existing = load_existing(&state.pool, std::slice::from_ref(&input)).await?;
    let input = validate_single(input, &existing)?;

    let created = StudentParentRepo::create(&state.pool, &input).await?;
    tracing::info!(
        student_id = created.student.id,
        parent_id = created.parent_id,
        merged_parent = created.merged_parent,
        created_by = admin.staff_id,
        "Student created",
    );
    Ok(ApiResponse::created("Student and parent created", created))
}

/// POST /api/v1/student-and-parent/import
///
/// Bulk import from a CSV upload (multipart field `file`). All-or-nothing:
/// any validation error rejects the whole file and nothing is written.
/// [`parse_upload`] enforces the row limit.
pub async fn import_student_parents(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<ImportResponse>>)> {
    let data = read_upload(&mut multipart).await?;
    let parsed = parse_upload(&data)?;

    if parsed.rows.is_empty() {
        return Err(AppError::BadRequest("CSV file contains no data rows".into()));
    }

    let existing = {
        let mut names = Vec::with_capacity(parsed.rows.len());
        let mut telephones = Vec::with_capacity(parsed.rows.len() * 2);
        let mut nsns = Vec::new();
        for row in &parsed.rows {
            names.push(normalize_name(&row.name));
            telephones.push(row.telephone.clone());
            telephones.push(row.parent_telephone.clone());
            if !row.nsn.is_empty() {
                nsns.push(row.nsn.clone());
            }
        }
        StudentRepo::existing_records(&state.pool, &names, &telephones, &nsns).await?
    };

    let rows = validate_batch(&parsed.rows, &existing).map_err(|errors| {
        tracing::info!(errors = errors.len(), "Rejected CSV import");
        AppError::Core(CoreError::InvalidRows(errors))
    })?;

    let students = StudentParentRepo::create_many(&state.pool, &rows).await?;
    tracing::info!(
        created = students.len(),
        skipped = parsed.skipped.len(),
        imported_by = admin.staff_id,
        "CSV import committed",
    );

    Ok(ApiResponse::created(
        "Students imported",
        ImportResponse {
            created: students.len(),
            skipped: parsed.skipped,
            students,
        },
    ))
}

/// GET /api/v1/student-and-parent/template
///
/// The CSV header plus one example row, served as a download.
pub async fn download_template() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"student_parent_template.csv\"",
            ),
        ],
        csv_template(),
    )
}

/// Read the bytes of the `file` field, ignoring any other fields.
async fn read_upload(multipart: &mut Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::BadRequest(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Collision snapshot for already-normalised inputs.
async fn load_existing(
    pool: &DbPool,
    inputs: &[StudentParentInput],
) -> AppResult<ExistingRecords> {
    let names: Vec<String> = inputs.iter().map(|i| normalize_name(&i.name)).collect();
    let telephones: Vec<String> = inputs
        .iter()
        .flat_map(|i| [i.telephone.clone(), i.parent.telephone.clone()])
        .collect();
    let nsns: Vec<String> = inputs.iter().filter_map(|i| i.nsn.clone()).collect();
    Ok(StudentRepo::existing_records(pool, &names, &telephones, &nsns).await?)
}
