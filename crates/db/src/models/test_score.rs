//! Test score model and DTOs.

use schoolhub_core::types::{DbId, Score, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `test_scores` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TestScore {
    pub id: DbId,
    pub student_id: DbId,
    pub subject_id: DbId,
    pub staff_id: DbId,
    pub score: Score,
    pub created_at: Timestamp,
}

/// One student's score inside a bulk score submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreEntry {
    pub student_id: DbId,
    pub score: Score,
}
