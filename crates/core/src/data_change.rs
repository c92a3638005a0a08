//! Parent data-change requests (DCR): proposal validation, diffing, and the
//! merge-vs-update decision taken when staff approve a request.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::gender::Gender;
use crate::phone::validate_telephone;
use crate::types::DbId;

pub const DCR_STATUS_PENDING: &str = "pending";
pub const DCR_STATUS_APPROVED: &str = "approved";
pub const DCR_STATUS_REJECTED: &str = "rejected";

/// All valid request statuses.
pub const VALID_DCR_STATUSES: &[&str] =
    &[DCR_STATUS_PENDING, DCR_STATUS_APPROVED, DCR_STATUS_REJECTED];

/// Validate a status filter value.
pub fn validate_dcr_status(status: &str) -> Result<(), String> {
    if VALID_DCR_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_DCR_STATUSES.join(", ")
        ))
    }
}

/// Fields a parent proposes to change. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentProposal {
    pub new_name: Option<String>,
    pub new_telephone: Option<String>,
    pub new_email: Option<String>,
    pub new_gender: Option<Gender>,
}

impl ParentProposal {
    /// Trim strings and drop empty ones; lowercase the email.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            new_name: clean(self.new_name),
            new_telephone: clean(self.new_telephone),
            new_email: clean(self.new_email).map(|e| e.to_lowercase()),
            new_gender: self.new_gender,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.new_name.is_none()
            && self.new_telephone.is_none()
            && self.new_email.is_none()
            && self.new_gender.is_none()
    }

    /// Format checks on the proposed values. Call on a normalised proposal.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("At least one field must be proposed for change".to_string());
        }
        if let Some(telephone) = &self.new_telephone {
            validate_telephone(telephone)?;
        }
        if let Some(email) = &self.new_email {
            if !email.validate_email() {
                return Err(format!("email '{email}' is not a valid address"));
            }
        }
        Ok(())
    }
}

/// The current state of the parent a request targets.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentSnapshot {
    pub id: DbId,
    pub name: String,
    pub gender: Gender,
    pub telephone: String,
    pub email: Option<String>,
}

/// Typed partial update: only fields that actually change are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParentUpdate {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub telephone: Option<String>,
    pub email: Option<String>,
}

impl ParentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.telephone.is_none()
            && self.email.is_none()
    }

    /// Names of the fields this update touches, in column order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.gender.is_some() {
            fields.push("gender");
        }
        if self.telephone.is_some() {
            fields.push("telephone");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        fields
    }
}

/// Diff a proposal against the current row.
pub fn diff_parent(current: &ParentSnapshot, proposal: &ParentProposal) -> ParentUpdate {
    ParentUpdate {
        name: proposal
            .new_name
            .clone()
            .filter(|n| *n != current.name),
        gender: proposal.new_gender.filter(|g| *g != current.gender),
        telephone: proposal
            .new_telephone
            .clone()
            .filter(|t| *t != current.telephone),
        email: proposal
            .new_email
            .clone()
            .filter(|e| current.email.as_deref() != Some(e.as_str())),
    }
}

/// What approving a request will do.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangePlan {
    /// The proposal matches the current row; only the request is closed.
    Unchanged,
    /// Mutate the current parent row with the changed fields.
    Update(ParentUpdate),
    /// Another parent already owns the new telephone/email: move every
    /// student of the current parent onto it instead of mutating the row.
    MergeInto { target_parent_id: DbId },
}

/// Decide between update and merge.
///
/// `other_parent` is the id of an existing parent (if any) whose telephone or
/// email equals the *changed* telephone/email in `diff`.
pub fn plan_parent_change(
    current: &ParentSnapshot,
    diff: ParentUpdate,
    other_parent: Option<DbId>,
) -> ChangePlan {
    if diff.is_empty() {
        return ChangePlan::Unchanged;
    }
    match other_parent {
        Some(target) if target != current.id => ChangePlan::MergeInto {
            target_parent_id: target,
        },
        _ => ChangePlan::Update(diff),
    }
}
