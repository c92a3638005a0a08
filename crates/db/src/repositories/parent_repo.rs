//! Repository for the `parents` table.
//!
//! Most writes happen inside a transaction owned by a multi-table operation
//! (student creation, CSV import, data-change approval), so the mutating
//! helpers take a [`PgTx`].

use schoolhub_core::data_change::ParentUpdate;
use schoolhub_core::parent_match::{normalize_name, KnownParent};
use schoolhub_core::types::DbId;
use sqlx::PgPool;

use super::PgTx;
use crate::models::parent::{CreateParent, Parent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, gender, telephone, email, created_at, updated_at";

/// Normalised-name SQL expression; must agree with [`normalize_name`].
const NORMALIZED_NAME: &str = "lower(regexp_replace(trim(name), '\\s+', ' ', 'g'))";

/// Provides lookups and transactional writes for parents.
pub struct ParentRepo;

impl ParentRepo {
    /// Find a non-deleted parent by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Parent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parents WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Parent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a non-deleted parent by telephone.
    pub async fn find_by_telephone(
        pool: &PgPool,
        telephone: &str,
    ) -> Result<Option<Parent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM parents WHERE telephone = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Parent>(&query)
            .bind(telephone)
            .fetch_optional(pool)
            .await
    }

    /// Same as [`Self::find_by_telephone`] but locks the row for the rest of
    /// the transaction.
    pub async fn find_by_telephone_tx(
        tx: &mut PgTx<'_>,
        telephone: &str,
    ) -> Result<Option<Parent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM parents
             WHERE telephone = $1 AND deleted_at IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, Parent>(&query)
            .bind(telephone)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Parents that could match the given keys on telephone, email or
    /// normalised name. The caller decides which one wins.
    pub async fn match_candidates_tx(
        tx: &mut PgTx<'_>,
        name: &str,
        telephone: &str,
        email: Option<&str>,
    ) -> Result<Vec<KnownParent>, sqlx::Error> {
        let query = format!(
            "SELECT id, name, telephone, email FROM parents
             WHERE deleted_at IS NULL
               AND (telephone = $1
                    OR ($2::TEXT IS NOT NULL AND email IS NOT NULL AND lower(email) = lower($2))
                    OR {NORMALIZED_NAME} = $3)
             ORDER BY id"
        );
        let rows: Vec<(DbId, String, String, Option<String>)> = sqlx::query_as(&query)
            .bind(telephone)
            .bind(email)
            .bind(normalize_name(name))
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, telephone, email)| KnownParent {
                id,
                name,
                telephone,
                email,
            })
            .collect())
    }

    /// Insert a parent inside a transaction.
    pub async fn create_tx(tx: &mut PgTx<'_>, input: &CreateParent) -> Result<Parent, sqlx::Error> {
        let query = format!(
            "INSERT INTO parents (name, gender, telephone, email)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Parent>(&query)
            .bind(&input.name)
            .bind(&input.gender)
            .bind(&input.telephone)
            .bind(&input.email)
            .fetch_one(&mut **tx)
            .await
    }

    /// A different non-deleted parent owning `telephone` or `email`.
    ///
    /// Telephone hits are preferred over email hits.
    pub async fn find_other_owner_tx(
        tx: &mut PgTx<'_>,
        exclude_id: DbId,
        telephone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<DbId>, sqlx::Error> {
        if telephone.is_none() && email.is_none() {
            return Ok(None);
        }
        sqlx::query_scalar(
            "SELECT id FROM parents
             WHERE deleted_at IS NULL AND id <> $1
               AND (($2::TEXT IS NOT NULL AND telephone = $2)
                    OR ($3::TEXT IS NOT NULL AND email IS NOT NULL AND lower(email) = lower($3)))
             ORDER BY (telephone = $2) DESC NULLS LAST, id
             LIMIT 1",
        )
        .bind(exclude_id)
        .bind(telephone)
        .bind(email)
        .fetch_optional(&mut **tx)
        .await
    }

    /// `true` if a non-deleted student uses this telephone.
    pub async fn telephone_used_by_student_tx(
        tx: &mut PgTx<'_>,
        telephone: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM students WHERE telephone = $1 AND deleted_at IS NULL)",
        )
        .bind(telephone)
        .fetch_one(&mut **tx)
        .await
    }

    /// Apply the changed fields of a [`ParentUpdate`].
    pub async fn apply_update_tx(
        tx: &mut PgTx<'_>,
        id: DbId,
        update: &ParentUpdate,
    ) -> Result<Parent, sqlx::Error> {
        let query = format!(
            "UPDATE parents SET
                name = COALESCE($2, name),
                gender = COALESCE($3, gender),
                telephone = COALESCE($4, telephone),
                email = COALESCE($5, email)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Parent>(&query)
            .bind(id)
            .bind(&update.name)
            .bind(update.gender.map(|g| g.as_str()))
            .bind(&update.telephone)
            .bind(&update.email)
            .fetch_one(&mut **tx)
            .await
    }

    /// Soft-delete a parent. Returns `true` if the row was updated.
    pub async fn soft_delete_tx(tx: &mut PgTx<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE parents SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a parent once its last student is gone.
    ///
    /// Returns `true` if the parent was deleted.
    pub async fn soft_delete_if_orphaned_tx(
        tx: &mut PgTx<'_>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE parents SET deleted_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
               AND NOT EXISTS (
                   SELECT 1 FROM students WHERE parent_id = $1 AND deleted_at IS NULL
               )",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
