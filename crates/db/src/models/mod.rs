//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches, where the entity is mutable

pub mod data_change_request;
pub mod notification_history;
pub mod parent;
pub mod staff;
pub mod student;
pub mod subject;
pub mod test_score;
