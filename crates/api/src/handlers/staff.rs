//! Handlers for the `/staff` resource (account management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_core::roles::validate_role;
use schoolhub_core::types::DbId;
use schoolhub_db::models::staff::{CreateStaff, StaffResponse, UpdateStaff};
use schoolhub_db::repositories::StaffRepo;
use serde::Deserialize;
use validator::ValidateEmail;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /staff`.
#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/staff
///
/// Create a staff account. Returns the account without its password hash.
pub async fn create_staff(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateStaffRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<StaffResponse>>)> {
    let username = input.username.trim().to_string();
    let name = input.name.trim().to_string();
    let email = normalized_email(&input.email)?;

    if username.is_empty() || name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "username and name are required".into(),
        )));
    }
    validate_role(&input.role).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let staff = StaffRepo::create(
        &state.pool,
        &CreateStaff {
            username,
            name,
            email,
            password_hash,
            role: input.role,
        },
    )
    .await?;

    tracing::info!(staff_id = staff.id, created_by = admin.staff_id, "Staff account created");
    Ok(ApiResponse::created("Staff created", staff.into()))
}

/// GET /api/v1/staff
pub async fn list_staff(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<ApiResponse<Vec<StaffResponse>>>> {
    let staff = StaffRepo::list(&state.pool).await?;
    Ok(ApiResponse::ok(
        "Staff retrieved",
        staff.into_iter().map(StaffResponse::from).collect(),
    ))
}

/// GET /api/v1/staff/{id}
pub async fn get_staff(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<StaffResponse>>> {
    let staff = StaffRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Staff", id }))?;
    Ok(ApiResponse::ok("Staff retrieved", staff.into()))
}

/// PUT /api/v1/staff/{id}
///
/// Update profile fields, role, or active flag. Passwords are not changed here.
pub async fn update_staff(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateStaff>,
) -> AppResult<Json<ApiResponse<StaffResponse>>> {
    if let Some(role) = &input.role {
        validate_role(role).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    if let Some(email) = input.email.take() {
        input.email = Some(normalized_email(&email)?);
    }
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation("name must not be empty".into())));
    }
    if id == admin.staff_id && input.is_active == Some(false) {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot deactivate your own account".into(),
        )));
    }

    let staff = StaffRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Staff", id }))?;
    Ok(ApiResponse::ok("Staff updated", staff.into()))
}

/// DELETE /api/v1/staff/{id}
///
/// Deactivate an account (sets `is_active = false`).
pub async fn deactivate_staff(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    if id == admin.staff_id {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot deactivate your own account".into(),
        )));
    }
    if !StaffRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Staff", id }));
    }
    tracing::info!(staff_id = id, deactivated_by = admin.staff_id, "Staff account deactivated");
    Ok(ApiResponse::ok("Staff deactivated", ()))
}

/// Trimmed, lowercased email, or a validation error.
fn normalized_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.validate_email() {
        Ok(email)
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "email '{email}' is not a valid address"
        ))))
    }
}
