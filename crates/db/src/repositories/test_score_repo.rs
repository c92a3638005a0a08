//! Repository for the `test_scores` table.
//!
//! A score is "pending" until it has been sent to the parent, after which it
//! is soft-deleted. At most one pending score exists per
//! (student, subject, staff).
//!
//! Lookups take `recorded_by: Option<DbId>`: `Some` restricts them to the
//! scores one staff member entered, `None` (admins) covers every recorder.

use schoolhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::test_score::{ScoreEntry, TestScore};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, subject_id, staff_id, score, created_at";

/// Provides score recording and pending-score lookups.
pub struct TestScoreRepo;

impl TestScoreRepo {
    /// Record scores for a subject, replacing any pending score of the same
    /// student. All entries are written in one transaction.
    pub async fn record_many(
        pool: &PgPool,
        staff_id: DbId,
        subject_id: DbId,
        entries: &[ScoreEntry],
    ) -> Result<Vec<TestScore>, sqlx::Error> {
        let query = format!(
            "INSERT INTO test_scores (student_id, subject_id, staff_id, score)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (student_id, subject_id, staff_id) WHERE deleted_at IS NULL
             DO UPDATE SET score = EXCLUDED.score
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut saved = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, TestScore>(&query)
                .bind(entry.student_id)
                .bind(subject_id)
                .bind(staff_id)
                .bind(entry.score)
                .fetch_one(&mut *tx)
                .await?;
            saved.push(row);
        }
        tx.commit().await?;
        Ok(saved)
    }

    /// Pending scores for a subject.
    pub async fn list_pending(
        pool: &PgPool,
        recorded_by: Option<DbId>,
        subject_id: DbId,
    ) -> Result<Vec<TestScore>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM test_scores
             WHERE ($1::BIGINT IS NULL OR staff_id = $1)
               AND subject_id = $2 AND deleted_at IS NULL
             ORDER BY student_id, created_at DESC"
        );
        sqlx::query_as::<_, TestScore>(&query)
            .bind(recorded_by)
            .bind(subject_id)
            .fetch_all(pool)
            .await
    }

    /// Pending score of one student, if recorded.
    ///
    /// With several recorders the most recent entry wins.
    pub async fn find_pending(
        pool: &PgPool,
        recorded_by: Option<DbId>,
        subject_id: DbId,
        student_id: DbId,
    ) -> Result<Option<TestScore>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM test_scores
             WHERE ($1::BIGINT IS NULL OR staff_id = $1)
               AND subject_id = $2 AND student_id = $3 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, TestScore>(&query)
            .bind(recorded_by)
            .bind(subject_id)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete pending scores by id.
    ///
    /// Returns the number of rows updated.
    pub async fn soft_delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE test_scores SET deleted_at = NOW()
             WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
