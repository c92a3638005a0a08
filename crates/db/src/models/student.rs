//! Student model and DTOs.

use schoolhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `students` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: DbId,
    pub nsn: Option<String>,
    pub name: String,
    pub grade: i32,
    pub grade_label: String,
    pub gender: String,
    pub telephone: String,
    pub parent_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a student under an existing parent.
#[derive(Debug, Clone)]
pub struct CreateStudent {
    pub nsn: Option<String>,
    pub name: String,
    pub grade: i32,
    pub grade_label: String,
    pub gender: String,
    pub telephone: String,
    pub parent_id: DbId,
}

/// DTO for updating a student. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudent {
    pub nsn: Option<String>,
    pub name: Option<String>,
    pub grade: Option<i32>,
    pub grade_label: Option<String>,
    pub gender: Option<String>,
    pub telephone: Option<String>,
}

/// List filter for students.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFilter {
    pub grade: Option<i32>,
    pub grade_label: Option<String>,
}

/// A student joined with its parent. Used for listings and as the
/// notification recipient record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentWithParent {
    pub student_id: DbId,
    pub nsn: Option<String>,
    pub name: String,
    pub grade: i32,
    pub grade_label: String,
    pub gender: String,
    pub telephone: String,
    pub parent_id: DbId,
    pub parent_name: String,
    pub parent_gender: String,
    pub parent_telephone: String,
    pub parent_email: Option<String>,
}

/// Result of creating a student through the merge-aware path.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedStudent {
    pub student: Student,
    pub parent_id: DbId,
    /// `true` when the student was attached to an already existing parent.
    pub merged_parent: bool,
}
