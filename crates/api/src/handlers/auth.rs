//! Handlers for `/login` (staff login and current profile).

use axum::extract::State;
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_db::models::staff::StaffResponse;
use schoolhub_db::repositories::StaffRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub staff: StaffResponse,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

/// POST /api/v1/login
///
/// Authenticate with username + password and return a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let staff = StaffRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&input.password, &staff.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(username = %staff.username, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    if !staff.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    StaffRepo::record_login(&state.pool, staff.id).await?;

    let access_token = generate_access_token(staff.id, &staff.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(staff_id = staff.id, role = %staff.role, "Staff logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            access_token,
            token_type: "Bearer",
            expires_in: state.config.jwt.access_token_expiry_mins * 60,
            staff: staff.into(),
        },
    ))
}

/// GET /api/v1/login/me
///
/// Profile of the authenticated staff member.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StaffResponse>>> {
    let staff = StaffRepo::find_by_id(&state.pool, user.staff_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account no longer active".into())))?;

    Ok(ApiResponse::ok("Profile retrieved", staff.into()))
}
