//! Integration tests for student + parent creation, merging and the
//! conflict snapshot used by the CSV import.
//!
//! Needs a running Postgres reachable through `DATABASE_URL`.

use schoolhub_core::gender::Gender;
use schoolhub_core::student_import::{NewParentInput, StudentParentInput, ValidatedRow};
use schoolhub_db::models::student::{CreatedStudent, StudentFilter};
use schoolhub_db::repositories::{ParentRepo, StudentParentRepo, StudentRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn input(
    name: &str,
    telephone: &str,
    parent_name: &str,
    parent_telephone: &str,
) -> StudentParentInput {
    StudentParentInput {
        nsn: None,
        name: name.to_string(),
        grade: 7,
        grade_label: "A".to_string(),
        gender: Gender::Male,
        telephone: telephone.to_string(),
        parent: NewParentInput {
            name: parent_name.to_string(),
            gender: Gender::Female,
            telephone: parent_telephone.to_string(),
            email: None,
        },
    }
}

async fn create(
    pool: &PgPool,
    name: &str,
    telephone: &str,
    parent_name: &str,
    parent_telephone: &str,
) -> CreatedStudent {
    StudentParentRepo::create(pool, &input(name, telephone, parent_name, parent_telephone))
        .await
        .unwrap()
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE deleted_at IS NULL"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_inserts_student_and_parent(pool: PgPool) {
    let created = create(&pool, "Andi", "081100000001", "Siti", "081200000001").await;
    assert!(!created.merged_parent);
    assert_eq!(created.student.parent_id, created.parent_id);

    let parent = ParentRepo::find_by_id(&pool, created.parent_id).await.unwrap().unwrap();
    assert_eq!(parent.telephone, "081200000001");
    assert_eq!(parent.gender, "female");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_parent_telephone_match_attaches_to_existing_parent(pool: PgPool) {
    let first = create(&pool, "Andi", "081100000001", "Siti", "081200000001").await;
    let second = StudentParentRepo::create(
        &pool,
        &input("Budi", "081100000002", "Ibu Siti", "081200000001"),
    )
    .await
    .unwrap();

    assert!(second.merged_parent);
    assert_eq!(second.parent_id, first.parent_id);
    assert_eq!(count(&pool, "parents").await, 1);
    assert_eq!(count(&pool, "students").await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_parent_name_match_is_case_insensitive(pool: PgPool) {
    let first = create(&pool, "Andi", "081100000001", "Siti Aminah", "081200000001").await;
    let second = StudentParentRepo::create(
        &pool,
        &input("Budi", "081100000002", "  SITI   aminah ", "081200000002"),
    )
    .await
    .unwrap();
    assert_eq!(second.parent_id, first.parent_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_many_merges_siblings_within_batch(pool: PgPool) {
    let rows = vec![
        ValidatedRow {
            row_number: 2,
            input: input("Andi", "081100000001", "Siti", "081200000001"),
        },
        ValidatedRow {
            row_number: 3,
            input: input("Ani", "081100000002", "Siti", "081200000001"),
        },
    ];
    let created = StudentParentRepo::create_many(&pool, &rows).await.unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].parent_id, created[1].parent_id);
    assert!(created[1].merged_parent);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_many_rolls_back_on_failure(pool: PgPool) {
    // The second row reuses the first row's student telephone, which the
    // unique index rejects after the first row was already inserted.
    let rows = vec![
        ValidatedRow {
            row_number: 2,
            input: input("Andi", "081100000001", "Siti", "081200000001"),
        },
        ValidatedRow {
            row_number: 3,
            input: input("Budi", "081100000001", "Rina", "081200000002"),
        },
    ];
    assert!(StudentParentRepo::create_many(&pool, &rows).await.is_err());
    assert_eq!(count(&pool, "students").await, 0);
    assert_eq!(count(&pool, "parents").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_existing_records_snapshot(pool: PgPool) {
    create(&pool, "Andi  Saputra", "081100000001", "Siti", "081200000001").await;

    let existing = StudentRepo::existing_records(
        &pool,
        &["andi saputra".to_string(), "nobody".to_string()],
        &["081100000001".to_string(), "081200000001".to_string()],
        &[],
    )
    .await
    .unwrap();

    assert!(existing.student_names.contains("andi saputra"));
    assert!(!existing.student_names.contains("nobody"));
    assert!(existing.student_telephones.contains("081100000001"));
    assert!(existing.parent_telephones.contains("081200000001"));
    assert!(existing.nsns.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_soft_delete_last_student_removes_parent(pool: PgPool) {
    let created = create(&pool, "Andi", "081100000001", "Siti", "081200000001").await;

    assert!(StudentRepo::soft_delete(&pool, created.student.id).await.unwrap());
    assert!(!StudentRepo::soft_delete(&pool, created.student.id).await.unwrap());
    assert!(ParentRepo::find_by_id(&pool, created.parent_id).await.unwrap().is_none());
    assert!(StudentRepo::list(&pool, &StudentFilter::default()).await.unwrap().is_empty());
}
