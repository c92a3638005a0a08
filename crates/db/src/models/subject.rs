//! Subject model and DTOs.

use schoolhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `subjects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub grade: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a subject.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubject {
    pub code: String,
    pub name: String,
    pub grade: i32,
}

/// DTO for updating a subject. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubject {
    pub code: Option<String>,
    pub name: Option<String>,
    pub grade: Option<i32>,
}
