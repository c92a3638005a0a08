//! Parent model and DTOs.

use schoolhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `parents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Parent {
    pub id: DbId,
    pub name: String,
    pub gender: String,
    pub telephone: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a parent.
#[derive(Debug, Clone)]
pub struct CreateParent {
    pub name: String,
    pub gender: String,
    pub telephone: String,
    pub email: Option<String>,
}
