//! Startup wiring that needs the database or the environment.
//!
//! - [`ensure_admin`] creates the first admin account on an empty install.
//! - [`build_dispatcher`] assembles the notification dispatcher from the
//!   configured channels.

use std::sync::Arc;

use schoolhub_core::error::CoreError;
use schoolhub_core::notification::MessageTemplates;
use schoolhub_core::roles::ROLE_ADMIN;
use schoolhub_db::models::staff::CreateStaff;
use schoolhub_db::repositories::StaffRepo;
use schoolhub_db::DbPool;
use schoolhub_notify::delivery::email::SmtpEmailTransport;
use schoolhub_notify::delivery::whatsapp::WhatsAppTransport;
use schoolhub_notify::{DeliveryError, NotificationDispatcher, PgNotificationStore};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::config::{BootstrapAdmin, ServerConfig};
use crate::error::AppError;

/// Create the bootstrap admin when no active admin exists.
///
/// Returns `true` if an account was created.
pub async fn ensure_admin(pool: &DbPool, admin: &BootstrapAdmin) -> Result<bool, AppError> {
    if StaffRepo::count_active_admins(pool).await? > 0 {
        tracing::debug!("Active admin present, skipping bootstrap");
        return Ok(false);
    }
    if StaffRepo::find_by_username(pool, &admin.username).await?.is_some() {
        tracing::warn!(
            username = %admin.username,
            "Bootstrap username is taken by a non-admin account, skipping bootstrap",
        );
        return Ok(false);
    }

    validate_password_strength(&admin.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let staff = StaffRepo::create(
        pool,
        &CreateStaff {
            username: admin.username.clone(),
            name: "Administrator".to_string(),
            email: admin.email.clone(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(staff_id = staff.id, username = %staff.username, "Bootstrap admin created");
    Ok(true)
}

/// Build the dispatcher with whichever channels are configured.
pub fn build_dispatcher(
    pool: DbPool,
    config: &ServerConfig,
) -> Result<NotificationDispatcher, DeliveryError> {
    let templates = MessageTemplates::new(config.notify.locale, config.notify.school_name.clone());
    let store = Arc::new(PgNotificationStore::new(pool));
    let mut dispatcher =
        NotificationDispatcher::new(store, templates).with_send_timeout(config.notify.send_timeout);

    match &config.email {
        Some(email) => {
            dispatcher = dispatcher.with_email(Arc::new(SmtpEmailTransport::new(email.clone())?));
            tracing::info!(
                host = %email.smtp_host,
                port = email.smtp_port,
                "Email channel enabled"
            );
        }
        None => tracing::warn!("SMTP_HOST not set, email channel disabled"),
    }

    match &config.whatsapp {
        Some(whatsapp) => {
            dispatcher = dispatcher.with_chat(Arc::new(WhatsAppTransport::new(whatsapp.clone())?));
            tracing::info!(api_url = %whatsapp.api_url, "WhatsApp channel enabled");
        }
        None => tracing::warn!("WHATSAPP_API_URL not set, WhatsApp channel disabled"),
    }

    Ok(dispatcher)
}
