//! Repository for the append-only `notification_histories` table.

use sqlx::PgPool;

use crate::models::notification_history::{
    CreateNotificationHistory, HistoryFilter, NotificationHistory,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, parent_id, subject_id, staff_id, kind, \
                        email_status, whatsapp_status, created_at";

/// Provides append and list operations for notification history.
pub struct NotificationHistoryRepo;

impl NotificationHistoryRepo {
    /// Append one history row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotificationHistory,
    ) -> Result<NotificationHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_histories
                (student_id, parent_id, subject_id, staff_id, kind, email_status, whatsapp_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationHistory>(&query)
            .bind(input.student_id)
            .bind(input.parent_id)
            .bind(input.subject_id)
            .bind(input.staff_id)
            .bind(&input.kind)
            .bind(input.email_status)
            .bind(input.whatsapp_status)
            .fetch_one(pool)
            .await
    }

    /// List history rows, newest first, with pagination.
    pub async fn list(
        pool: &PgPool,
        filter: &HistoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_histories
             WHERE ($1::BIGINT IS NULL OR student_id = $1)
               AND ($2::TEXT IS NULL OR kind = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, NotificationHistory>(&query)
            .bind(filter.student_id)
            .bind(&filter.kind)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
