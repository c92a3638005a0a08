//! Domain logic for the SchoolHub backend.
//!
//! Everything here is pure: no database, no network. The repository,
//! notification and API crates feed data in and act on the decisions made
//! here.

pub mod data_change;
pub mod error;
pub mod gender;
pub mod notification;
pub mod parent_match;
pub mod phone;
pub mod roles;
pub mod student_import;
pub mod types;
