//! Integration tests for data-change requests: storage, and the approve and
//! reject operations (update, merge, no-op, conflicts).
//!
//! Needs a running Postgres reachable through `DATABASE_URL`.

use assert_matches::assert_matches;
use schoolhub_core::data_change::{
    ParentUpdate, DCR_STATUS_APPROVED, DCR_STATUS_PENDING, DCR_STATUS_REJECTED,
};
use schoolhub_core::error::CoreError;
use schoolhub_core::gender::Gender;
use schoolhub_core::student_import::{NewParentInput, StudentParentInput};
use schoolhub_db::models::data_change_request::{ApprovalAction, CreateDataChangeRequest};
use schoolhub_db::models::staff::CreateStaff;
use schoolhub_db::models::student::CreatedStudent;
use schoolhub_db::repositories::{
    DataChangeRequestRepo, ParentRepo, ReviewError, StaffRepo, StudentParentRepo, StudentRepo,
};
use sqlx::PgPool;

fn input(
    name: &str,
    telephone: &str,
    parent_name: &str,
    parent_telephone: &str,
) -> StudentParentInput {
    StudentParentInput {
        nsn: None,
        name: name.to_string(),
        grade: 8,
        grade_label: "B".to_string(),
        gender: Gender::Female,
        telephone: telephone.to_string(),
        parent: NewParentInput {
            name: parent_name.to_string(),
            gender: Gender::Male,
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

async fn reviewer(pool: &PgPool) -> i64 {
    StaffRepo::create(
        pool,
        &CreateStaff {
            username: "admin".to_string(),
            name: "Admin".to_string(),
            email: "admin@school.test".to_string(),
            password_hash: "hash".to_string(),
            role: "admin".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_request_lifecycle(pool: PgPool) {
    let staff_id = reviewer(&pool).await;
    let request = DataChangeRequestRepo::create(
        &pool,
        &CreateDataChangeRequest {
            old_telephone: "081200000001".to_string(),
            new_name: Some("Budi".to_string()),
            new_gender: None,
            new_telephone: None,
            new_email: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(request.status, DCR_STATUS_PENDING);

    let pending = DataChangeRequestRepo::list(&pool, Some(DCR_STATUS_PENDING)).await.unwrap();
    assert_eq!(pending.len(), 1);

    let mut tx = pool.begin().await.unwrap();
    let locked = DataChangeRequestRepo::find_for_review_tx(&mut tx, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(locked.id, request.id);
    let reviewed =
        DataChangeRequestRepo::mark_reviewed_tx(&mut tx, request.id, DCR_STATUS_APPROVED, staff_id)
            .await
            .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(reviewed.status, DCR_STATUS_APPROVED);
    assert_eq!(reviewed.reviewed_by, Some(staff_id));
    assert!(reviewed.reviewed_at.is_some());
    assert!(DataChangeRequestRepo::list(&pool, Some(DCR_STATUS_PENDING))
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_apply_update_changes_only_given_fields(pool: PgPool) {
    let created = create(&pool, "Ani", "081100000001", "Budi", "081200000001").await;

    let mut tx = pool.begin().await.unwrap();
    let updated = ParentRepo::apply_update_tx(
        &mut tx,
        created.parent_id,
        &ParentUpdate {
            email: Some("budi@mail.com".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.name, "Budi");
    assert_eq!(updated.telephone, "081200000001");
    assert_eq!(updated.email.as_deref(), Some("budi@mail.com"));
}

async fn submit(
    pool: &PgPool,
    old_telephone: &str,
    new_name: Option<&str>,
    new_telephone: Option<&str>,
) -> i64 {
    DataChangeRequestRepo::create(
        pool,
        &CreateDataChangeRequest {
            old_telephone: old_telephone.to_string(),
            new_name: new_name.map(str::to_string),
            new_gender: None,
            new_telephone: new_telephone.map(str::to_string),
            new_email: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_approve_updates_parent_in_place(pool: PgPool) {
    let admin = reviewer(&pool).await;
    let created = create(&pool, "Ani", "081100000001", "Budi", "081200000001").await;
    let id = submit(&pool, "081200000001", Some("Budi Santoso"), Some("081200000009")).await;

    let outcome = DataChangeRequestRepo::approve(&pool, id, admin).await.unwrap();

    assert_eq!(outcome.action, ApprovalAction::Updated);
    assert_eq!(outcome.parent_id, created.parent_id);
    assert_eq!(outcome.changed_fields, vec!["name", "telephone"]);
    assert_eq!(outcome.students_moved, 0);
    assert_eq!(outcome.request.status, DCR_STATUS_APPROVED);
    assert_eq!(outcome.request.reviewed_by, Some(admin));

    let parent = ParentRepo::find_by_id(&pool, created.parent_id).await.unwrap().unwrap();
    assert_eq!(parent.name, "Budi Santoso");
    assert_eq!(parent.telephone, "081200000009");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_approve_merges_into_parent_owning_new_telephone(pool: PgPool) {
    let admin = reviewer(&pool).await;
    let old = create(&pool, "Ani", "081100000001", "Budi", "081200000001").await;
    let target = create(&pool, "Dewi", "081100000002", "Rina", "081200000002").await;
    let id = submit(&pool, "081200000001", None, Some("081200000002")).await;

    let outcome = DataChangeRequestRepo::approve(&pool, id, admin).await.unwrap();

    assert_eq!(outcome.action, ApprovalAction::Merged);
    assert_eq!(outcome.parent_id, target.parent_id);
    assert_eq!(outcome.students_moved, 1);

    let student = StudentRepo::find_by_id(&pool, old.student.id).await.unwrap().unwrap();
    assert_eq!(student.parent_id, target.parent_id);
    assert!(ParentRepo::find_by_id(&pool, old.parent_id).await.unwrap().is_none());
    let kept = ParentRepo::find_by_id(&pool, target.parent_id).await.unwrap().unwrap();
    assert_eq!(kept.name, "Rina");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_approve_identical_proposal_only_closes_request(pool: PgPool) {
    let admin = reviewer(&pool).await;
    let created = create(&pool, "Ani", "081100000001", "Budi", "081200000001").await;
    let id = submit(&pool, "081200000001", Some("Budi"), None).await;

    let outcome = DataChangeRequestRepo::approve(&pool, id, admin).await.unwrap();

    assert_eq!(outcome.action, ApprovalAction::Unchanged);
    assert_eq!(outcome.parent_id, created.parent_id);
    assert!(outcome.changed_fields.is_empty());
    assert_eq!(outcome.request.status, DCR_STATUS_APPROVED);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_approve_rejects_telephone_owned_by_a_student(pool: PgPool) {
    let admin = reviewer(&pool).await;
    create(&pool, "Ani", "081100000001", "Budi", "081200000001").await;
    let id = submit(&pool, "081200000001", None, Some("081100000001")).await;

    let err = DataChangeRequestRepo::approve(&pool, id, admin).await.unwrap_err();
    assert_matches!(err, ReviewError::Rejected(CoreError::Conflict(msg)) => {
        assert!(msg.contains("registered to a student"));
    });

    // Rolled back: the request is still pending and the parent unchanged.
    let request = DataChangeRequestRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(request.status, DCR_STATUS_PENDING);
    assert!(ParentRepo::find_by_telephone(&pool, "081200000001")
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_closed_request_cannot_be_reviewed_again(pool: PgPool) {
    let admin = reviewer(&pool).await;
    create(&pool, "Ani", "081100000001", "Budi", "081200000001").await;
    let id = submit(&pool, "081200000001", Some("Budi S."), None).await;

    let rejected = DataChangeRequestRepo::reject(&pool, id, admin).await.unwrap();
    assert_eq!(rejected.status, DCR_STATUS_REJECTED);

    assert_matches!(
        DataChangeRequestRepo::approve(&pool, id, admin).await,
        Err(ReviewError::Rejected(CoreError::Conflict(_)))
    );
    assert_matches!(
        DataChangeRequestRepo::reject(&pool, id, admin).await,
        Err(ReviewError::Rejected(CoreError::Conflict(_)))
    );
    let parent = ParentRepo::find_by_telephone(&pool, "081200000001").await.unwrap().unwrap();
    assert_eq!(parent.name, "Budi");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_missing_request_or_parent_is_not_found(pool: PgPool) {
    let admin = reviewer(&pool).await;
    assert_matches!(
        DataChangeRequestRepo::approve(&pool, 999, admin).await,
        Err(ReviewError::Rejected(CoreError::NotFound { id: 999, .. }))
    );

    let id = submit(&pool, "081299999999", Some("Nobody"), None).await;
    assert_matches!(
        DataChangeRequestRepo::approve(&pool, id, admin).await,
        Err(ReviewError::Rejected(CoreError::NotFoundBy { entity: "Parent", .. }))
    );
}
