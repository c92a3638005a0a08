//! Integration tests for pending test scores and their per-recorder scope.
//!
//! Needs a running Postgres reachable through `DATABASE_URL`.

use schoolhub_core::gender::Gender;
use schoolhub_core::student_import::{NewParentInput, StudentParentInput};
use schoolhub_core::types::DbId;
use schoolhub_db::models::staff::CreateStaff;
use schoolhub_db::models::subject::CreateSubject;
use schoolhub_db::models::test_score::ScoreEntry;
use schoolhub_db::repositories::{StaffRepo, StudentParentRepo, SubjectRepo, TestScoreRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn staff(pool: &PgPool, username: &str, role: &str) -> DbId {
    let input = CreateStaff {
        username: username.to_string(),
        name: username.to_string(),
        email: format!("{username}@school.test"),
        password_hash: "not-a-real-hash".to_string(),
        role: role.to_string(),
    };
    StaffRepo::create(pool, &input).await.unwrap().id
}

async fn subject(pool: &PgPool) -> DbId {
    let input = CreateSubject {
        code: "MAT7".to_string(),
        name: "Matematika".to_string(),
        grade: 7,
    };
    SubjectRepo::create(pool, &input).await.unwrap().id
}

async fn student(pool: &PgPool) -> DbId {
    let input = StudentParentInput {
        nsn: None,
        name: "Andi".to_string(),
        grade: 7,
        grade_label: "A".to_string(),
        gender: Gender::Male,
        telephone: "081100000001".to_string(),
        parent: NewParentInput {
            name: "Siti".to_string(),
            gender: Gender::Female,
            telephone: "081200000001".to_string(),
            email: None,
        },
    };
    StudentParentRepo::create(pool, &input).await.unwrap().student.id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_pending_score_is_scoped_to_its_recorder(pool: PgPool) {
    let teacher = staff(&pool, "guru", "teacher").await;
    let admin = staff(&pool, "kepala", "admin").await;
    let subject_id = subject(&pool).await;
    let student_id = student(&pool).await;

    let entries = [ScoreEntry {
        student_id,
        score: Some(82.0),
    }];
    let saved = TestScoreRepo::record_many(&pool, teacher, subject_id, &entries)
        .await
        .unwrap();

    let own = TestScoreRepo::find_pending(&pool, Some(teacher), subject_id, student_id)
        .await
        .unwrap();
    assert_eq!(own.map(|s| s.id), Some(saved[0].id));

    let other = TestScoreRepo::find_pending(&pool, Some(admin), subject_id, student_id)
        .await
        .unwrap();
    assert!(other.is_none());

    let any = TestScoreRepo::find_pending(&pool, None, subject_id, student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(any.staff_id, teacher);
    assert_eq!(any.score, Some(82.0));

    let listed = TestScoreRepo::list_pending(&pool, None, subject_id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_soft_delete_many_clears_only_given_rows(pool: PgPool) {
    let teacher = staff(&pool, "guru", "teacher").await;
    let subject_id = subject(&pool).await;
    let student_id = student(&pool).await;

    let entries = [ScoreEntry {
        student_id,
        score: None,
    }];
    let saved = TestScoreRepo::record_many(&pool, teacher, subject_id, &entries)
        .await
        .unwrap();

    assert_eq!(TestScoreRepo::soft_delete_many(&pool, &[saved[0].id]).await.unwrap(), 1);
    assert_eq!(TestScoreRepo::soft_delete_many(&pool, &[saved[0].id]).await.unwrap(), 0);
    assert!(TestScoreRepo::find_pending(&pool, None, subject_id, student_id)
        .await
        .unwrap()
        .is_none());
}
