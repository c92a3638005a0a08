//! Repository for the `students` table.

use schoolhub_core::student_import::ExistingRecords;
use schoolhub_core::types::DbId;
use sqlx::PgPool;

use super::{ParentRepo, PgTx};
use crate::models::student::{
    CreateStudent, Student, StudentFilter, StudentWithParent, UpdateStudent,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, nsn, name, grade, grade_label, gender, telephone, parent_id, \
                        created_at, updated_at";

/// Select list for [`StudentWithParent`]; expects `students s JOIN parents p`.
const JOINED_COLUMNS: &str = "s.id AS student_id, s.nsn, s.name, s.grade, s.grade_label, \
                              s.gender, s.telephone, p.id AS parent_id, p.name AS parent_name, \
                              p.gender AS parent_gender, p.telephone AS parent_telephone, \
                              p.email AS parent_email";

/// Provides CRUD operations for students.
pub struct StudentRepo;

impl StudentRepo {
    /// Insert a student inside a transaction.
    pub async fn create_tx(
        tx: &mut PgTx<'_>,
        input: &CreateStudent,
    ) -> Result<Student, sqlx::Error> {
        let query = format!(
            "INSERT INTO students (nsn, name, grade, grade_label, gender, telephone, parent_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(&input.nsn)
            .bind(&input.name)
            .bind(input.grade)
            .bind(&input.grade_label)
            .bind(&input.gender)
            .bind(&input.telephone)
            .bind(input.parent_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a non-deleted student by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM students WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List non-deleted students, optionally filtered by grade and label.
    pub async fn list(pool: &PgPool, filter: &StudentFilter) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM students
             WHERE deleted_at IS NULL
               AND ($1::INTEGER IS NULL OR grade = $1)
               AND ($2::TEXT IS NULL OR grade_label = upper($2))
             ORDER BY grade, grade_label, name"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(filter.grade)
            .bind(&filter.grade_label)
            .fetch_all(pool)
            .await
    }

    /// List non-deleted students joined with their parent.
    pub async fn list_with_parent(
        pool: &PgPool,
        filter: &StudentFilter,
    ) -> Result<Vec<StudentWithParent>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM students s
             JOIN parents p ON p.id = s.parent_id
             WHERE s.deleted_at IS NULL
               AND ($1::INTEGER IS NULL OR s.grade = $1)
               AND ($2::TEXT IS NULL OR s.grade_label = upper($2))
             ORDER BY s.grade, s.grade_label, s.name"
        );
        sqlx::query_as::<_, StudentWithParent>(&query)
            .bind(filter.grade)
            .bind(&filter.grade_label)
            .fetch_all(pool)
            .await
    }

    /// Look up one non-deleted student with its parent.
    pub async fn find_with_parent(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<StudentWithParent>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM students s
             JOIN parents p ON p.id = s.parent_id
             WHERE s.id = $1 AND s.deleted_at IS NULL"
        );
        sqlx::query_as::<_, StudentWithParent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a student. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no non-deleted row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStudent,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!(
            "UPDATE students SET
                nsn = COALESCE($2, nsn),
                name = COALESCE($3, name),
                grade = COALESCE($4, grade),
                grade_label = COALESCE($5, grade_label),
                gender = COALESCE($6, gender),
                telephone = COALESCE($7, telephone)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(&input.nsn)
            .bind(&input.name)
            .bind(input.grade)
            .bind(&input.grade_label)
            .bind(&input.gender)
            .bind(&input.telephone)
            .fetch_optional(pool)
            .await
    }

    /// `true` if `telephone` belongs to a non-deleted parent or to a
    /// non-deleted student other than `exclude_id`.
    pub async fn telephone_taken(
        pool: &PgPool,
        telephone: &str,
        exclude_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM students
                 WHERE telephone = $1 AND id <> $2 AND deleted_at IS NULL
             ) OR EXISTS(
                 SELECT 1 FROM parents WHERE telephone = $1 AND deleted_at IS NULL
             )",
        )
        .bind(telephone)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete a student, and its parent too if no other student is left.
    ///
    /// Returns `true` if the student was deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let parent_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE students SET deleted_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING parent_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(parent_id) = parent_id else {
            return Ok(false);
        };
        if ParentRepo::soft_delete_if_orphaned_tx(&mut tx, parent_id).await? {
            tracing::debug!(parent_id, "Soft-deleted parent with no remaining students");
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Move every non-deleted student of `from_parent` onto `to_parent`.
    ///
    /// Returns the number of students moved.
    pub async fn reassign_parent_tx(
        tx: &mut PgTx<'_>,
        from_parent: DbId,
        to_parent: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE students SET parent_id = $2 WHERE parent_id = $1 AND deleted_at IS NULL",
        )
        .bind(from_parent)
        .bind(to_parent)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Snapshot of existing values that incoming records may collide with.
    ///
    /// Only values present in the arguments are fetched, so the result stays
    /// proportional to the batch rather than the table.
    pub async fn existing_records(
        pool: &PgPool,
        names: &[String],
        telephones: &[String],
        nsns: &[String],
    ) -> Result<ExistingRecords, sqlx::Error> {
        let student_names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT lower(regexp_replace(trim(name), '\\s+', ' ', 'g'))
             FROM students
             WHERE deleted_at IS NULL
               AND lower(regexp_replace(trim(name), '\\s+', ' ', 'g')) = ANY($1)",
        )
        .bind(names)
        .fetch_all(pool)
        .await?;

        let student_telephones: Vec<String> = sqlx::query_scalar(
            "SELECT telephone FROM students WHERE deleted_at IS NULL AND telephone = ANY($1)",
        )
        .bind(telephones)
        .fetch_all(pool)
        .await?;

        let parent_telephones: Vec<String> = sqlx::query_scalar(
            "SELECT telephone FROM parents WHERE deleted_at IS NULL AND telephone = ANY($1)",
        )
        .bind(telephones)
        .fetch_all(pool)
        .await?;

        let existing_nsns: Vec<String> = sqlx::query_scalar(
            "SELECT nsn FROM students
             WHERE deleted_at IS NULL AND nsn IS NOT NULL AND nsn = ANY($1)",
        )
        .bind(nsns)
        .fetch_all(pool)
        .await?;

        Ok(ExistingRecords {
            student_names: student_names.into_iter().collect(),
            student_telephones: student_telephones.into_iter().collect(),
            parent_telephones: parent_telephones.into_iter().collect(),
            nsns: existing_nsns.into_iter().collect(),
        })
    }
}
