//! Staff role name constants.
//!
//! These must match the `CHECK` constraint on `staff.role` in the initial
//! migration.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEACHER: &str = "teacher";

/// All assignable staff roles.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_TEACHER];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}
