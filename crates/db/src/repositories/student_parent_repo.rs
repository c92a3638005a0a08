//! Transactional student + parent creation with same-parent merging.
//!
//! Used by single-record creation and by the CSV import. Every write of one
//! call happens in one transaction, so a failure on row N rolls back rows
//! 1..N-1 as well.

use schoolhub_core::parent_match::{match_parent, ParentKeys};
use schoolhub_core::student_import::{StudentParentInput, ValidatedRow};
use sqlx::PgPool;

use super::{ParentRepo, PgTx, StudentRepo};
use crate::models::parent::CreateParent;
use crate::models::student::{CreateStudent, CreatedStudent};

/// Provides the multi-table student + parent write path.
pub struct StudentParentRepo;

impl StudentParentRepo {
    /// Create one student, attaching it to a matching parent or a new one.
    pub async fn create(
        pool: &PgPool,
        input: &StudentParentInput,
    ) -> Result<CreatedStudent, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let created = Self::create_tx(&mut tx, input).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Create every validated row in a single transaction.
    ///
    /// Parents inserted for earlier rows are visible to later rows, so
    /// siblings in the same upload end up sharing one parent.
    pub async fn create_many(
        pool: &PgPool,
        rows: &[ValidatedRow],
    ) -> Result<Vec<CreatedStudent>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            created.push(Self::create_tx(&mut tx, &row.input).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn create_tx(
        tx: &mut PgTx<'_>,
        input: &StudentParentInput,
    ) -> Result<CreatedStudent, sqlx::Error> {
        let parent = &input.parent;
        let candidates = ParentRepo::match_candidates_tx(
            tx,
            &parent.name,
            &parent.telephone,
            parent.email.as_deref(),
        )
        .await?;

        let keys = ParentKeys {
            name: &parent.name,
            telephone: &parent.telephone,
            email: parent.email.as_deref(),
        };
        let (parent_id, merged_parent) = match match_parent(keys, &candidates) {
            Some(hit) => {
                tracing::debug!(
                    parent_id = hit.parent_id,
                    reason = ?hit.reason,
                    "Attaching student to existing parent",
                );
                (hit.parent_id, true)
            }
            None => {
                let created = ParentRepo::create_tx(
                    tx,
                    &CreateParent {
                        name: parent.name.clone(),
                        gender: parent.gender.as_str().to_string(),
                        telephone: parent.telephone.clone(),
                        email: parent.email.clone(),
                    },
                )
                .await?;
                (created.id, false)
            }
        };

        let student = StudentRepo::create_tx(
            tx,
            &CreateStudent {
                nsn: input.nsn.clone(),
                name: input.name.clone(),
                grade: input.grade,
                grade_label: input.grade_label.clone(),
                gender: input.gender.as_str().to_string(),
                telephone: input.telephone.clone(),
                parent_id,
            },
        )
        .await?;

        Ok(CreatedStudent {
            student,
            parent_id,
            merged_parent,
        })
    }
}
