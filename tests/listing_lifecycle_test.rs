//! Integration Tests: Listing Lifecycle
//!
//! Exercises the transactional listing pipeline with a real database.
//!
//! Coverage:
//! - Create/edit with partial patches and counters
//! - Rollback of field updates and image rows on blob-store failure
//! - Audit entries present on success, absent on failure
//! - Version conflicts and the moderation state machine
//! - Hard delete with image cascade
//!
//! Architecture:
//! - Uses testcontainers for PostgreSQL
//! - Uses an in-memory blob store double instead of the storage gateway

mod common;

use bytes::Bytes;
use common::mock_blob_store::MockBlobStore;
use std::sync::Arc;
use uuid::Uuid;

use xevip_api::db::Database;
use xevip_api::error::AppError;
use xevip_api::models::{ListingPatch, ListingStatus, NewImage};
use xevip_api::services::ListingService;

fn jpeg(name: &str) -> NewImage {
    NewImage {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]),
    }
}

async fn image_count(pool: &sqlx::PgPool, listing_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM listing_images WHERE listing_id = $1")
        .bind(listing_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // Run manually: cargo test --test listing_lifecycle_test -- test_create_then_partial_edit --ignored
async fn test_create_then_partial_edit() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );

    let listing = service
        .create(seller, common::camry_listing(brand_id, model_id), vec![])
        .await
        .expect("create failed");

    assert_eq!(listing.status, ListingStatus::Pending);
    assert_eq!(listing.views_count, 0);
    assert_eq!(listing.edits_count, 0);
    assert_eq!(listing.reports_count, 0);
    assert_eq!(listing.version, 1);
    assert_eq!(
        common::count_audit_entries(&pool, "listing.create", &listing.id.to_string()).await,
        1
    );

    let patch = ListingPatch {
        price_vnd: Some(480_000_000),
        ..Default::default()
    };
    let updated = service
        .edit(listing.id, patch, vec![], vec![], seller, Some(seller), None)
        .await
        .expect("edit failed");

    assert_eq!(updated.price_vnd, 480_000_000);
    assert_eq!(updated.title, "Toyota Camry");
    assert_eq!(updated.edits_count, 1);
    assert_eq!(updated.version, 2);
    assert_eq!(
        common::count_audit_entries(&pool, "listing.update", &listing.id.to_string()).await,
        1
    );
}

#[tokio::test]
#[ignore]
async fn test_edit_rolls_back_on_storage_failure() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let working = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );
    let listing = working
        .create(
            seller,
            common::camry_listing(brand_id, model_id),
            vec![jpeg("front.jpg")],
        )
        .await
        .expect("create failed");
    assert_eq!(image_count(&pool, listing.id).await, 1);

    // Second upload of the edit fails; the first must not survive either.
    let failing = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::failing_from(1)),
    );
    let patch = ListingPatch {
        title: Some("Toyota Camry 2.5Q".to_string()),
        ..Default::default()
    };
    let result = failing
        .edit(
            listing.id,
            patch,
            vec![jpeg("side.jpg"), jpeg("rear.jpg")],
            vec![],
            seller,
            Some(seller),
            None,
        )
        .await;

    assert!(matches!(result, Err(AppError::Storage(_))));

    let (title, edits_count, version): (String, i32, i32) =
        sqlx::query_as("SELECT title, edits_count, version FROM listings WHERE id = $1")
            .bind(listing.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(title, "Toyota Camry");
    assert_eq!(edits_count, 0);
    assert_eq!(version, 1);
    assert_eq!(image_count(&pool, listing.id).await, 1);
    assert_eq!(
        common::count_audit_entries(&pool, "listing.update", &listing.id.to_string()).await,
        0
    );
}

#[tokio::test]
#[ignore]
async fn test_image_diff_is_scoped_to_the_listing() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );

    let mine = service
        .create(
            seller,
            common::camry_listing(brand_id, model_id),
            vec![jpeg("a.jpg")],
        )
        .await
        .unwrap();
    let other = service
        .create(
            seller,
            common::camry_listing(brand_id, model_id),
            vec![jpeg("b.jpg")],
        )
        .await
        .unwrap();

    let foreign_image_id: Uuid =
        sqlx::query_scalar("SELECT id FROM listing_images WHERE listing_id = $1")
            .bind(other.id)
            .fetch_one(&pool)
            .await
            .unwrap();

    // Deleting a foreign image id through my listing matches nothing.
    let patch = ListingPatch {
        description: Some("updated".to_string()),
        ..Default::default()
    };
    service
        .edit(
            mine.id,
            patch,
            vec![],
            vec![foreign_image_id],
            seller,
            Some(seller),
            None,
        )
        .await
        .expect("edit failed");

    assert_eq!(image_count(&pool, other.id).await, 1);
    assert_eq!(image_count(&pool, mine.id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_new_images_get_next_positions() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );
    let listing = service
        .create(
            seller,
            common::camry_listing(brand_id, model_id),
            vec![jpeg("a.jpg"), jpeg("b.jpg")],
        )
        .await
        .unwrap();

    service
        .edit(
            listing.id,
            ListingPatch::default(),
            vec![jpeg("c.jpg")],
            vec![],
            seller,
            Some(seller),
            None,
        )
        .await
        .unwrap();

    let positions: Vec<i32> = sqlx::query_scalar(
        "SELECT position FROM listing_images WHERE listing_id = $1 ORDER BY position",
    )
    .bind(listing.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[tokio::test]
#[ignore]
async fn test_stale_version_conflicts_and_missing_id_is_not_found() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let admin = common::create_test_user(&pool, true).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );
    let listing = service
        .create(seller, common::camry_listing(brand_id, model_id), vec![])
        .await
        .unwrap();

    let stale = service
        .change_status(listing.id, ListingStatus::Approved, admin, Some(999))
        .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    let missing = service
        .change_status(Uuid::new_v4(), ListingStatus::Approved, admin, None)
        .await;
    match missing {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Listing not found"),
        other => panic!("expected NotFound, got {:?}", other.map(|l| l.id)),
    }

    let stale_edit = service
        .edit(
            listing.id,
            ListingPatch {
                price_vnd: Some(450_000_000),
                ..Default::default()
            },
            vec![],
            vec![],
            seller,
            Some(seller),
            Some(999),
        )
        .await;
    assert!(matches!(stale_edit, Err(AppError::Conflict(_))));
}

#[tokio::test]
#[ignore]
async fn test_status_machine_enforces_transitions() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let admin = common::create_test_user(&pool, true).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );
    let listing = service
        .create(seller, common::camry_listing(brand_id, model_id), vec![])
        .await
        .unwrap();

    // pending -> sold skips review
    let skip = service
        .change_status(listing.id, ListingStatus::Sold, admin, None)
        .await;
    assert!(matches!(skip, Err(AppError::InvalidTransition { .. })));

    let approved = service
        .change_status(listing.id, ListingStatus::Approved, admin, None)
        .await
        .unwrap();
    assert_eq!(approved.status, ListingStatus::Approved);
    assert!(approved.approved_at.is_some());
    assert_eq!(approved.approved_by, Some(admin));
    assert_eq!(
        common::count_audit_entries(&pool, "listing.status.change", &listing.id.to_string()).await,
        1
    );

    let sold = service
        .change_status(listing.id, ListingStatus::Sold, seller, None)
        .await
        .unwrap();
    assert_eq!(sold.status, ListingStatus::Sold);

    // sold is terminal
    let revive = service
        .change_status(listing.id, ListingStatus::Approved, admin, None)
        .await;
    assert!(matches!(revive, Err(AppError::InvalidTransition { .. })));
}

#[tokio::test]
#[ignore]
async fn test_delete_cascades_images_and_audits() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let admin = common::create_test_user(&pool, true).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );
    let listing = service
        .create(
            seller,
            common::camry_listing(brand_id, model_id),
            vec![jpeg("a.jpg")],
        )
        .await
        .unwrap();

    service.delete(listing.id, admin).await.expect("delete failed");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings WHERE id = $1")
        .bind(listing.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(image_count(&pool, listing.id).await, 0);
    assert_eq!(
        common::count_audit_entries(&pool, "listing.delete", &listing.id.to_string()).await,
        1
    );

    let again = service.delete(listing.id, admin).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_non_owner_edit_is_forbidden() {
    let pool = common::setup_test_db().await.expect("db setup failed");
    let seller = common::create_test_user(&pool, false).await;
    let stranger = common::create_test_user(&pool, false).await;
    let (brand_id, model_id) = common::seed_catalog(&pool).await;

    let service = ListingService::new(
        Database::from_pool(pool.clone()),
        Arc::new(MockBlobStore::new()),
    );
    let listing = service
        .create(seller, common::camry_listing(brand_id, model_id), vec![])
        .await
        .unwrap();

    let result = service
        .edit(
            listing.id,
            ListingPatch {
                price_vnd: Some(1),
                ..Default::default()
            },
            vec![],
            vec![],
            stranger,
            Some(stranger),
            None,
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden)));
    assert_eq!(
        common::count_audit_entries(&pool, "listing.update", &listing.id.to_string()).await,
        0
    );
}
