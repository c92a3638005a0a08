//! Handlers for `/sender`: channel status and test sends.

use axum::extract::State;
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_core::notification::Locale;
use schoolhub_core::phone::validate_telephone;
use schoolhub_notify::DeliveryError;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_TEST_MESSAGE: &str = "This is a test message from SchoolHub.";

#[derive(Debug, Serialize)]
pub struct ChannelInfo {
    pub enabled: bool,
    /// SMTP host or WhatsApp gateway URL.
    pub endpoint: Option<String>,
    /// From address or WhatsApp sender id.
    pub sender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SenderStatus {
    pub email: ChannelInfo,
    pub whatsapp: ChannelInfo,
    pub locale: Locale,
    pub school_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TestWhatsAppRequest {
    pub telephone: String,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub to: String,
    pub message: Option<String>,
}

/// GET /api/v1/sender
pub async fn sender_status(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Json<ApiResponse<SenderStatus>> {
    let config = &state.config;
    let email = ChannelInfo {
        enabled: state.dispatcher.email_enabled(),
        endpoint: config.email.as_ref().map(|e| e.smtp_host.clone()),
        sender: config.email.as_ref().map(|e| e.from_address.clone()),
    };
    let whatsapp = ChannelInfo {
        enabled: state.dispatcher.chat_enabled(),
        endpoint: config.whatsapp.as_ref().map(|w| w.api_url.clone()),
        sender: config.whatsapp.as_ref().map(|w| w.sender_id.clone()),
    };
    let templates = state.dispatcher.templates();

    ApiResponse::ok(
        "Sender status retrieved",
        SenderStatus {
            email,
            whatsapp,
            locale: templates.locale,
            school_name: templates.school_name.clone(),
        },
    )
}

/// POST /api/v1/sender/test-whatsapp
pub async fn test_whatsapp(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<TestWhatsAppRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let telephone = input.telephone.trim();
    validate_telephone(telephone).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let message = message_or_default(input.message);

    state
        .dispatcher
        .send_test_chat(telephone, &message)
        .await
        .map_err(delivery_error)?;
    Ok(ApiResponse::ok("Test WhatsApp message sent", ()))
}

/// POST /api/v1/sender/test-email
pub async fn test_email(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<TestEmailRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let to = input.to.trim().to_string();
    if !to.validate_email() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "email '{to}' is not a valid address"
        ))));
    }
    let message = message_or_default(input.message);

    state
        .dispatcher
        .send_test_email(&to, &message)
        .await
        .map_err(delivery_error)?;
    Ok(ApiResponse::ok("Test email sent", ()))
}

fn message_or_default(message: Option<String>) -> String {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_TEST_MESSAGE.to_string())
}

/// An unconfigured channel is the caller's problem; anything else is upstream.
fn delivery_error(err: DeliveryError) -> AppError {
    match err {
        DeliveryError::NotConfigured(channel) => {
            AppError::BadRequest(format!("{channel} channel is not configured"))
        }
        other => AppError::BadGateway(other.to_string()),
    }
}
