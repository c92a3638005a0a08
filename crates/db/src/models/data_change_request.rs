//! Parent data-change request model and DTOs.

use schoolhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `parent_data_change_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DataChangeRequest {
    pub id: DbId,
    pub old_telephone: String,
    pub new_name: Option<String>,
    pub new_gender: Option<String>,
    pub new_telephone: Option<String>,
    pub new_email: Option<String>,
    pub status: String,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for submitting a request.
#[derive(Debug, Clone)]
pub struct CreateDataChangeRequest {
    pub old_telephone: String,
    pub new_name: Option<String>,
    pub new_gender: Option<String>,
    pub new_telephone: Option<String>,
    pub new_email: Option<String>,
}

/// What approving a request did to the parent table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// The proposal matched the parent row; only the request was closed.
    Unchanged,
    Updated,
    /// The students were moved to the parent already owning the new contact.
    Merged,
}

/// Result of an approval.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub request: DataChangeRequest,
    pub action: ApprovalAction,
    /// The parent the students belong to after approval.
    pub parent_id: DbId,
    pub changed_fields: Vec<&'static str>,
    /// Students moved to another parent (merge only).
    pub students_moved: u64,
}
