//! Same-parent detection.
//!
//! When a student is created (directly or through a CSV import) the parent
//! fields are compared against existing parents. A hit attaches the new
//! student to the existing parent instead of inserting a duplicate row.
//!
//! Keys are tried in priority order: telephone, then email (only when both
//! sides carry one), then name (case-insensitive, trimmed). The first key
//! with a hit wins, so a telephone match always beats a name match on a
//! different row.

use serde::Serialize;

use crate::types::DbId;

/// Which key produced a parent match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Telephone,
    Email,
    Name,
}

/// Identifying fields of a parent about to be created.
#[derive(Debug, Clone, Copy)]
pub struct ParentKeys<'a> {
    pub name: &'a str,
    pub telephone: &'a str,
    pub email: Option<&'a str>,
}

/// Identifying fields of an existing (non-deleted) parent row.
#[derive(Debug, Clone)]
pub struct KnownParent {
    pub id: DbId,
    pub name: String,
    pub telephone: String,
    pub email: Option<String>,
}

/// Result of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentMatch {
    pub parent_id: DbId,
    pub reason: MatchReason,
}

/// Normalise a name for comparison.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Pick the existing parent the new parent should merge onto, if any.
pub fn match_parent(keys: ParentKeys<'_>, known: &[KnownParent]) -> Option<ParentMatch> {
    if let Some(p) = known.iter().find(|p| p.telephone == keys.telephone) {
        return Some(ParentMatch {
            parent_id: p.id,
            reason: MatchReason::Telephone,
        });
    }

    if let Some(email) = keys.email.filter(|e| !e.is_empty()) {
        if let Some(p) = known
            .iter()
            .find(|p| p.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
        {
            return Some(ParentMatch {
                parent_id: p.id,
                reason: MatchReason::Email,
            });
        }
    }

    let wanted = normalize_name(keys.name);
    known
        .iter()
        .find(|p| normalize_name(&p.name) == wanted)
        .map(|p| ParentMatch {
            parent_id: p.id,
            reason: MatchReason::Name,
        })
}
