//! Primitive aliases shared by every crate in the workspace.

/// Primary keys are PostgreSQL `BIGSERIAL`.
pub type DbId = i64;

/// Timestamps are stored as `TIMESTAMPTZ` and always handled in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A test score. `None` means the score was recorded without a value yet.
pub type Score = Option<f64>;
