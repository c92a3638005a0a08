//! Request handlers, one module per resource.

pub mod auth;
pub mod data_change;
pub mod notification;
pub mod sender;
pub mod staff;
pub mod student;
pub mod student_parent;
pub mod subject;
pub mod test_score;

use schoolhub_core::error::CoreError;
use schoolhub_core::types::DbId;
use schoolhub_db::models::subject::Subject;
use schoolhub_db::repositories::SubjectRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load a subject and make sure the caller may act on it.
///
/// Admins may act on any subject; teachers only on subjects assigned to them.
pub(crate) async fn authorize_subject(
    state: &AppState,
    user: &AuthUser,
    subject_id: DbId,
) -> AppResult<Subject> {
    let subject = SubjectRepo::find_by_id(&state.pool, subject_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Subject",
            id: subject_id,
        }))?;

    if !user.is_admin() && !SubjectRepo::is_assigned(&state.pool, user.staff_id, subject_id).await?
    {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "You are not assigned to subject '{}'",
            subject.name
        ))));
    }
    Ok(subject)
}

/// Whose pending scores the caller works with: their own, or every
/// teacher's for admins.
pub(crate) fn score_scope(user: &AuthUser) -> Option<DbId> {
    if user.is_admin() {
        None
    } else {
        Some(user.staff_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::roles::{ROLE_ADMIN, ROLE_TEACHER};

    #[test]
    fn admins_see_every_teachers_scores() {
        let admin = AuthUser {
            staff_id: 1,
            role: ROLE_ADMIN.to_string(),
        };
        let teacher = AuthUser {
            staff_id: 5,
            role: ROLE_TEACHER.to_string(),
        };
        assert_eq!(score_scope(&admin), None);
        assert_eq!(score_scope(&teacher), Some(5));
    }
}
