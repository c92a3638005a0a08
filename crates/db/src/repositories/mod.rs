//! Repository layer: one zero-sized struct per table (or per multi-table
//! write), each exposing async functions that take a `&PgPool` or an open
//! transaction.

pub mod data_change_request_repo;
pub mod notification_history_repo;
pub mod parent_repo;
pub mod staff_repo;
pub mod student_parent_repo;
pub mod student_repo;
pub mod subject_repo;
pub mod test_score_repo;

pub use data_change_request_repo::{DataChangeRequestRepo, ReviewError};
pub use notification_history_repo::NotificationHistoryRepo;
pub use parent_repo::ParentRepo;
pub use staff_repo::StaffRepo;
pub use student_parent_repo::StudentParentRepo;
pub use student_repo::StudentRepo;
pub use subject_repo::SubjectRepo;
pub use test_score_repo::TestScoreRepo;

/// Open transaction handle passed to the `*_tx` helpers.
pub type PgTx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;
