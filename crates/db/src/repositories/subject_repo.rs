//! Repository for the `subjects` and `staff_subjects` tables.

use schoolhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::subject::{CreateSubject, Subject, UpdateSubject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, code, name, grade, created_at, updated_at";

/// Provides CRUD operations for subjects and teaching assignments.
pub struct SubjectRepo;

impl SubjectRepo {
    /// Insert a new subject, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSubject) -> Result<Subject, sqlx::Error> {
        let query = format!(
            "INSERT INTO subjects (code, name, grade)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.grade)
            .fetch_one(pool)
            .await
    }

    /// Find a subject by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subjects WHERE id = $1");
        sqlx::query_as::<_, Subject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all subjects ordered by grade then code.
    pub async fn list(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subjects ORDER BY grade, code");
        sqlx::query_as::<_, Subject>(&query).fetch_all(pool).await
    }

    /// Update a subject. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSubject,
    ) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!(
            "UPDATE subjects SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                grade = COALESCE($4, grade)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.grade)
            .fetch_optional(pool)
            .await
    }

    /// Delete a subject. Assignments cascade. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Assign a subject to a staff member. Idempotent.
    ///
    /// Returns `true` if a new assignment was created.
    pub async fn assign(
        pool: &PgPool,
        staff_id: DbId,
        subject_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO staff_subjects (staff_id, subject_id)
             VALUES ($1, $2)
             ON CONFLICT (staff_id, subject_id) DO NOTHING",
        )
        .bind(staff_id)
        .bind(subject_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove an assignment. Returns `true` if one existed.
    pub async fn unassign(
        pool: &PgPool,
        staff_id: DbId,
        subject_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM staff_subjects WHERE staff_id = $1 AND subject_id = $2")
                .bind(staff_id)
                .bind(subject_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Subjects taught by a staff member.
    pub async fn list_for_staff(
        pool: &PgPool,
        staff_id: DbId,
    ) -> Result<Vec<Subject>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM subjects s
             JOIN staff_subjects ss ON ss.subject_id = s.id
             WHERE ss.staff_id = $1
             ORDER BY s.grade, s.code",
            prefixed("s")
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(staff_id)
            .fetch_all(pool)
            .await
    }

    /// `true` if the staff member is assigned to the subject.
    pub async fn is_assigned(
        pool: &PgPool,
        staff_id: DbId,
        subject_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM staff_subjects WHERE staff_id = $1 AND subject_id = $2)",
        )
        .bind(staff_id)
        .bind(subject_id)
        .fetch_one(pool)
        .await
    }
}

/// [`COLUMNS`] qualified with a table alias.
fn prefixed(alias: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
