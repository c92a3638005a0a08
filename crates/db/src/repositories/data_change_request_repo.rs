//! Repository for the `parent_data_change_requests` table, plus the review
//! operations that close a request.
//!
//! Approval runs in one transaction: lock the request, load the parent by
//! the telephone on file, diff it against the proposal, then either update
//! the row or merge its students into the parent that already owns the new
//! telephone or email.

use schoolhub_core::data_change::{
    diff_parent, plan_parent_change, ChangePlan, ParentProposal, ParentSnapshot,
    DCR_STATUS_APPROVED, DCR_STATUS_PENDING, DCR_STATUS_REJECTED,
};
use schoolhub_core::error::CoreError;
use schoolhub_core::gender::Gender;
use schoolhub_core::types::DbId;
use sqlx::PgPool;

use super::{ParentRepo, PgTx, StudentRepo};
use crate::models::data_change_request::{
    ApprovalAction, ApprovalOutcome, CreateDataChangeRequest, DataChangeRequest,
};
use crate::models::parent::Parent;

/// Why a review did not go through.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The request or its parent is missing, the request is already closed,
    /// or the change collides with a student's telephone.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, old_telephone, new_name, new_gender, new_telephone, new_email, \
                        status, reviewed_by, reviewed_at, created_at";

/// Provides persistence for parent data-change requests.
pub struct DataChangeRequestRepo;

impl DataChangeRequestRepo {
    /// Store a new pending request.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDataChangeRequest,
    ) -> Result<DataChangeRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO parent_data_change_requests
                (old_telephone, new_name, new_gender, new_telephone, new_email)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DataChangeRequest>(&query)
            .bind(&input.old_telephone)
            .bind(&input.new_name)
            .bind(&input.new_gender)
            .bind(&input.new_telephone)
            .bind(&input.new_email)
            .fetch_one(pool)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DataChangeRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parent_data_change_requests WHERE id = $1");
        sqlx::query_as::<_, DataChangeRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find and lock a request for review.
    pub async fn find_for_review_tx(
        tx: &mut PgTx<'_>,
        id: DbId,
    ) -> Result<Option<DataChangeRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM parent_data_change_requests WHERE id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, DataChangeRequest>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List requests, oldest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
    ) -> Result<Vec<DataChangeRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM parent_data_change_requests
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, DataChangeRequest>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Approve a pending request and apply it to the parent table.
    ///
    /// Nothing is written unless every step succeeds.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        reviewer_id: DbId,
    ) -> Result<ApprovalOutcome, ReviewError> {
        let mut tx = pool.begin().await?;

        let request = Self::lock_pending_tx(&mut tx, id).await?;
        let parent = ParentRepo::find_by_telephone_tx(&mut tx, &request.old_telephone)
            .await?
            .ok_or_else(|| CoreError::NotFoundBy {
                entity: "Parent",
                key: format!("telephone {}", request.old_telephone),
            })?;
        let current = snapshot(&parent)?;

        let diff = diff_parent(&current, &proposal_of(&request)?);
        let changed_fields = diff.changed_fields();
        let other_owner = ParentRepo::find_other_owner_tx(
            &mut tx,
            current.id,
            diff.telephone.as_deref(),
            diff.email.as_deref(),
        )
        .await?;

        let (action, parent_id, students_moved) =
            match plan_parent_change(&current, diff, other_owner) {
                ChangePlan::Unchanged => (ApprovalAction::Unchanged, current.id, 0),
                ChangePlan::Update(update) => {
                    if let Some(telephone) = &update.telephone {
                        if ParentRepo::telephone_used_by_student_tx(&mut tx, telephone).await? {
                            return Err(CoreError::Conflict(format!(
                                "telephone '{telephone}' is already registered to a student"
                            ))
                            .into());
                        }
                    }
                    ParentRepo::apply_update_tx(&mut tx, current.id, &update).await?;
                    (ApprovalAction::Updated, current.id, 0)
                }
                ChangePlan::MergeInto { target_parent_id } => {
                    let moved =
                        StudentRepo::reassign_parent_tx(&mut tx, current.id, target_parent_id)
                            .await?;
                    ParentRepo::soft_delete_tx(&mut tx, current.id).await?;
                    (ApprovalAction::Merged, target_parent_id, moved)
                }
            };

        let request =
            Self::mark_reviewed_tx(&mut tx, id, DCR_STATUS_APPROVED, reviewer_id).await?;
        tx.commit().await?;

        tracing::info!(
            request_id = id,
            parent_id,
            action = ?action,
            students_moved,
            "Data change request applied",
        );

        Ok(ApprovalOutcome {
            request,
            action,
            parent_id,
            changed_fields,
            students_moved,
        })
    }

    /// Reject a pending request. The parent table is not touched.
    pub async fn reject(
        pool: &PgPool,
        id: DbId,
        reviewer_id: DbId,
    ) -> Result<DataChangeRequest, ReviewError> {
        let mut tx = pool.begin().await?;
        Self::lock_pending_tx(&mut tx, id).await?;
        let request =
            Self::mark_reviewed_tx(&mut tx, id, DCR_STATUS_REJECTED, reviewer_id).await?;
        tx.commit().await?;
        Ok(request)
    }

    /// Lock the request row and make sure it is still pending.
    async fn lock_pending_tx(
        tx: &mut PgTx<'_>,
        id: DbId,
    ) -> Result<DataChangeRequest, ReviewError> {
        let request = Self::find_for_review_tx(tx, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "DataChangeRequest",
                id,
            })?;
        if request.status != DCR_STATUS_PENDING {
            return Err(CoreError::Conflict(format!(
                "Data change request {id} is already {}",
                request.status
            ))
            .into());
        }
        Ok(request)
    }

    /// Close a request with the given status and reviewer stamp.
    pub async fn mark_reviewed_tx(
        tx: &mut PgTx<'_>,
        id: DbId,
        status: &str,
        reviewer_id: DbId,
    ) -> Result<DataChangeRequest, sqlx::Error> {
        let query = format!(
            "UPDATE parent_data_change_requests SET
                status = $2,
                reviewed_by = $3,
                reviewed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DataChangeRequest>(&query)
            .bind(id)
            .bind(status)
            .bind(reviewer_id)
            .fetch_one(&mut **tx)
            .await
    }
}

fn parse_gender(value: &str) -> Result<Gender, CoreError> {
    value
        .parse()
        .map_err(|msg: String| CoreError::Internal(format!("Stored gender is invalid: {msg}")))
}

fn snapshot(parent: &Parent) -> Result<ParentSnapshot, CoreError> {
    Ok(ParentSnapshot {
        id: parent.id,
        name: parent.name.clone(),
        gender: parse_gender(&parent.gender)?,
        telephone: parent.telephone.clone(),
        email: parent.email.clone(),
    })
}

fn proposal_of(request: &DataChangeRequest) -> Result<ParentProposal, CoreError> {
    Ok(ParentProposal {
        new_name: request.new_name.clone(),
        new_telephone: request.new_telephone.clone(),
        new_email: request.new_email.clone(),
        new_gender: request.new_gender.as_deref().map(parse_gender).transpose()?,
    })
}
