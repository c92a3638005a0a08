//! Handlers for `/student/test-scores` (pending scores a teacher entered but
//! has not sent yet).

use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::Json;
use schoolhub_core::error::CoreError;
use schoolhub_core::types::DbId;
use schoolhub_db::models::test_score::{ScoreEntry, TestScore};
use schoolhub_db::repositories::TestScoreRepo;
use serde::Deserialize;

use super::{authorize_subject, score_scope};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub subject_id: DbId,
}

/// Request body for `POST /student/test-scores`.
#[derive(Debug, Deserialize)]
pub struct RecordScoresRequest {
    pub subject_id: DbId,
    pub scores: Vec<ScoreEntry>,
}

/// GET /api/v1/student/test-scores?subject_id=
///
/// Pending scores the caller entered for a subject. Admins see every
/// teacher's pending scores.
pub async fn list_scores(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ScoreQuery>,
) -> AppResult<Json<ApiResponse<Vec<TestScore>>>> {
    authorize_subject(&state, &user, query.subject_id).await?;
    let scores =
        TestScoreRepo::list_pending(&state.pool, score_scope(&user), query.subject_id).await?;
    Ok(ApiResponse::ok("Test scores retrieved", scores))
}

/// POST /api/v1/student/test-scores
///
/// Record or replace pending scores. A `null` score records the student as
/// untested.
pub async fn record_scores(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RecordScoresRequest>,
) -> AppResult<Json<ApiResponse<Vec<TestScore>>>> {
    validate_entries(&input.scores)?;
    authorize_subject(&state, &user, input.subject_id).await?;

    let saved =
        TestScoreRepo::record_many(&state.pool, user.staff_id, input.subject_id, &input.scores)
            .await?;
    tracing::info!(
        staff_id = user.staff_id,
        subject_id = input.subject_id,
        count = saved.len(),
        "Test scores recorded",
    );
    Ok(ApiResponse::ok("Test scores recorded", saved))
}

fn validate_entries(entries: &[ScoreEntry]) -> AppResult<()> {
    if entries.is_empty() {
        return Err(AppError::BadRequest("scores must not be empty".into()));
    }

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.student_id) {
            errors.push(format!("student {}: listed more than once", entry.student_id));
        }
        if let Some(score) = entry.score {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                errors.push(format!(
                    "student {}: score {score} is outside {MIN_SCORE}-{MAX_SCORE}",
                    entry.student_id
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::InvalidRows(errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn entry(student_id: DbId, score: Option<f64>) -> ScoreEntry {
        ScoreEntry { student_id, score }
    }

    #[test]
    fn valid_entries_pass() {
        let entries = [entry(1, Some(0.0)), entry(2, Some(100.0)), entry(3, None)];
        assert!(validate_entries(&entries).is_ok());
    }

    #[test]
    fn empty_entries_are_a_bad_request() {
        assert_matches!(validate_entries(&[]), Err(AppError::BadRequest(_)));
    }

    #[test]
    fn out_of_range_and_duplicates_are_collected() {
        let entries = [entry(1, Some(101.0)), entry(1, Some(50.0)), entry(2, Some(-1.0))];
        let err = validate_entries(&entries).unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::InvalidRows(errors)) => {
            assert_eq!(errors.len(), 3);
            assert!(errors[1].contains("more than once"));
        });
    }
}
