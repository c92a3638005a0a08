//! Handlers for parent data-change requests.
//!
//! Parents submit requests without an account; admins approve or reject
//! them. The approval itself lives in [`DataChangeRequestRepo::approve`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use schoolhub_core::data_change::{validate_dcr_status, ParentProposal};
use schoolhub_core::error::CoreError;
use schoolhub_core::phone::validate_telephone;
use schoolhub_core::types::DbId;
use schoolhub_db::models::data_change_request::{
    ApprovalOutcome, CreateDataChangeRequest, DataChangeRequest,
};
use schoolhub_db::repositories::{DataChangeRequestRepo, ParentRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /student-and-parent/data-change-requests`.
#[derive(Debug, Deserialize)]
pub struct SubmitChangeRequest {
    /// Telephone currently on file; identifies the parent.
    pub old_telephone: String,
    #[serde(flatten)]
    pub proposal: ParentProposal,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListChangeRequestsQuery {
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/student-and-parent/data-change-requests
///
/// Public: parents do not have staff accounts.
pub async fn submit_change_request(
    State(state): State<AppState>,
    Json(input): Json<SubmitChangeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DataChangeRequest>>)> {
    let old_telephone = input.old_telephone.trim().to_string();
    validate_telephone(&old_telephone)
        .map_err(|msg| AppError::Core(CoreError::Validation(format!("old_telephone: {msg}"))))?;

    let proposal = input.proposal.normalized();
    proposal
        .validate()
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    ParentRepo::find_by_telephone(&state.pool, &old_telephone)
        .await?
        .ok_or_else(|| parent_not_found(&old_telephone))?;

    let request = DataChangeRequestRepo::create(
        &state.pool,
        &CreateDataChangeRequest {
            old_telephone,
            new_name: proposal.new_name,
            new_gender: proposal.new_gender.map(|g| g.as_str().to_string()),
            new_telephone: proposal.new_telephone,
            new_email: proposal.new_email,
        },
    )
    .await?;

    tracing::info!(request_id = request.id, "Data change request submitted");
    Ok(ApiResponse::created("Data change request submitted", request))
}

/// GET /api/v1/student-and-parent/data-change-requests?status=
pub async fn list_change_requests(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ListChangeRequestsQuery>,
) -> AppResult<Json<ApiResponse<Vec<DataChangeRequest>>>> {
    if let Some(status) = &query.status {
        validate_dcr_status(status).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    let requests = DataChangeRequestRepo::list(&state.pool, query.status.as_deref()).await?;
    Ok(ApiResponse::ok("Data change requests retrieved", requests))
}

/// POST /api/v1/student-and-parent/data-change-requests/{id}/approve
///
/// Runs in one transaction; any failure leaves both the request and the
/// parent untouched.
pub async fn approve_change_request(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<ApprovalOutcome>>> {
    let outcome = DataChangeRequestRepo::approve(&state.pool, id, admin.staff_id).await?;
    tracing::info!(
        request_id = id,
        action = ?outcome.action,
        reviewed_by = admin.staff_id,
        "Data change request approved",
    );
    Ok(ApiResponse::ok("Data change request approved", outcome))
}

/// POST /api/v1/student-and-parent/data-change-requests/{id}/reject
pub async fn reject_change_request(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<DataChangeRequest>>> {
    let request = DataChangeRequestRepo::reject(&state.pool, id, admin.staff_id).await?;
    tracing::info!(request_id = id, reviewed_by = admin.staff_id, "Data change request rejected");
    Ok(ApiResponse::ok("Data change request rejected", request))
}

fn parent_not_found(telephone: &str) -> AppError {
    AppError::Core(CoreError::NotFoundBy {
        entity: "Parent",
        key: format!("telephone {telephone}"),
    })
}
