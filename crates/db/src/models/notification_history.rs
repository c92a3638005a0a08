//! Notification history model (append-only).

use schoolhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notification_histories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationHistory {
    pub id: DbId,
    pub student_id: DbId,
    pub parent_id: DbId,
    pub subject_id: DbId,
    pub staff_id: DbId,
    pub kind: String,
    pub email_status: bool,
    pub whatsapp_status: bool,
    pub created_at: Timestamp,
}

/// DTO for appending a history row.
#[derive(Debug, Clone)]
pub struct CreateNotificationHistory {
    pub student_id: DbId,
    pub parent_id: DbId,
    pub subject_id: DbId,
    pub staff_id: DbId,
    pub kind: String,
    pub email_status: bool,
    pub whatsapp_status: bool,
}

/// List filter for history queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub student_id: Option<DbId>,
    pub kind: Option<String>,
}
