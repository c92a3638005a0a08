//! Persistence seen by the dispatcher.
//!
//! [`NotificationStore`] abstracts the four queries a dispatch needs so the
//! dispatcher can be exercised without a database. [`PgNotificationStore`]
//! is the production implementation on top of the repositories.

use async_trait::async_trait;
use schoolhub_core::gender::Gender;
use schoolhub_core::types::DbId;
use schoolhub_db::models::notification_history::CreateNotificationHistory;
use schoolhub_db::models::student::StudentWithParent;
use schoolhub_db::repositories::{NotificationHistoryRepo, StudentRepo, TestScoreRepo};
use schoolhub_db::DbPool;

/// A student and the parent who receives the notification.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub student_id: DbId,
    pub student_name: String,
    pub student_gender: Gender,
    pub grade: i32,
    pub grade_label: String,
    pub parent_id: DbId,
    pub parent_name: String,
    pub parent_gender: Gender,
    pub parent_telephone: String,
    pub parent_email: Option<String>,
}

impl TryFrom<StudentWithParent> for Recipient {
    type Error = String;

    fn try_from(row: StudentWithParent) -> Result<Self, Self::Error> {
        Ok(Self {
            student_gender: row.gender.parse()?,
            parent_gender: row.parent_gender.parse()?,
            student_id: row.student_id,
            student_name: row.name,
            grade: row.grade,
            grade_label: row.grade_label,
            parent_id: row.parent_id,
            parent_name: row.parent_name,
            parent_telephone: row.parent_telephone,
            parent_email: row.parent_email,
        })
    }
}

/// A pending score row. `score` is `None` for a student recorded as untested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingScore {
    pub id: DbId,
    pub score: Option<f64>,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// The student with its parent, or `None` if no such student exists.
    async fn find_recipient(&self, student_id: DbId) -> Result<Option<Recipient>, sqlx::Error>;

    /// The pending score row for this student and subject, or `None` when no
    /// score was recorded. `recorded_by` restricts the lookup to one staff
    /// member's entries.
    async fn pending_score(
        &self,
        recorded_by: Option<DbId>,
        subject_id: DbId,
        student_id: DbId,
    ) -> Result<Option<PendingScore>, sqlx::Error>;

    /// Append one history row.
    async fn record_history(&self, entry: &CreateNotificationHistory) -> Result<(), sqlx::Error>;

    /// Soft-delete the given pending score rows.
    async fn clear_scores(&self, score_ids: &[DbId]) -> Result<u64, sqlx::Error>;
}

/// Postgres-backed [`NotificationStore`].
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn find_recipient(&self, student_id: DbId) -> Result<Option<Recipient>, sqlx::Error> {
        let Some(row) = StudentRepo::find_with_parent(&self.pool, student_id).await? else {
            return Ok(None);
        };
        Recipient::try_from(row)
            .map(Some)
            .map_err(|e| sqlx::Error::Decode(e.into()))
    }

    async fn pending_score(
        &self,
        recorded_by: Option<DbId>,
        subject_id: DbId,
        student_id: DbId,
    ) -> Result<Option<PendingScore>, sqlx::Error> {
        let row =
            TestScoreRepo::find_pending(&self.pool, recorded_by, subject_id, student_id).await?;
        Ok(row.map(|s| PendingScore {
            id: s.id,
            score: s.score,
        }))
    }

    async fn record_history(&self, entry: &CreateNotificationHistory) -> Result<(), sqlx::Error> {
        NotificationHistoryRepo::create(&self.pool, entry).await?;
        Ok(())
    }

    async fn clear_scores(&self, score_ids: &[DbId]) -> Result<u64, sqlx::Error> {
        TestScoreRepo::soft_delete_many(&self.pool, score_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(gender: &str) -> StudentWithParent {
        StudentWithParent {
            student_id: 1,
            nsn: None,
            name: "Andi".to_string(),
            grade: 7,
            grade_label: "A".to_string(),
            gender: gender.to_string(),
            telephone: "081100000001".to_string(),
            parent_id: 2,
            parent_name: "Siti".to_string(),
            parent_gender: "female".to_string(),
            parent_telephone: "081200000001".to_string(),
            parent_email: None,
        }
    }

    #[test]
    fn recipient_parses_genders() {
        let recipient = Recipient::try_from(row("male")).unwrap();
        assert_eq!(recipient.student_gender, Gender::Male);
        assert_eq!(recipient.parent_gender, Gender::Female);
        assert_eq!(recipient.parent_id, 2);
    }

    #[test]
    fn recipient_rejects_unknown_gender() {
        assert!(Recipient::try_from(row("unknown")).is_err());
    }
}
