use crate::types::DbId;

/// Domain-level error shared by the repository, notification, and API crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Lookup by a natural key (telephone, username, NSN) found nothing.
    #[error("Entity not found: {entity} with {key}")]
    NotFoundBy { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Batched row-level validation failures (CSV import, bulk score input).
    #[error("Validation failed for {} row(s)", .0.len())]
    InvalidRows(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rows_display_counts_messages() {
        let err = CoreError::InvalidRows(vec!["row 2: bad".into(), "row 3: bad".into()]);
        assert_eq!(err.to_string(), "Validation failed for 2 row(s)");
    }

    #[test]
    fn not_found_by_display_includes_key() {
        let err = CoreError::NotFoundBy {
            entity: "Parent",
            key: "telephone 0812".into(),
        };
        assert_eq!(err.to_string(), "Entity not found: Parent with telephone 0812");
    }
}
