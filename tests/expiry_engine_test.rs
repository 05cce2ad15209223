mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use uuid::Uuid;

use shelftrack_api::services::{
    batches::CreateBatchInput,
    inventory::RecordScanInput,
};

fn scan_input(batch_id: Uuid) -> RecordScanInput {
    RecordScanInput {
        batch_id,
        barcode: None,
        qr_code: None,
        location: None,
        notes: None,
        scanned_by: None,
    }
}

/// Spec scenario: register a batch expiring in five days, sweep before and
/// after the expiry date passes, then scan and ship an item without touching
/// the batch's expired flag.
#[tokio::test]
async fn scan_then_sweep_lifecycle() {
    let app = TestApp::new().await;
    let services = &app.state.services;

    let product_id = Uuid::parse_str(&app.create_product("Milk", None).await).unwrap();

    let now = Utc::now();
    let expiry = (now + Duration::days(5)).date_naive();

    let batch = services
        .batches
        .create_batch(
            CreateBatchInput {
                product_id,
                batch_number: "LOT-001".to_string(),
                manufacturing_date: None,
                expiry_date: expiry,
                quantity: Some(12),
            },
            now,
        )
        .await
        .expect("create batch");

    assert_eq!(batch.priority_level, 3);
    assert!(!batch.is_expired);
    assert_eq!(batch.product_name, "Milk");

    // Not yet past the expiry date: sweep changes nothing.
    let updated = services.expiry.sweep_expired(now).await.unwrap();
    assert_eq!(updated, 0);
    let batch = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert!(!batch.is_expired);

    // A day past expiry: exactly this batch flips.
    let later = now + Duration::days(6);
    let updated = services.expiry.sweep_expired(later).await.unwrap();
    assert_eq!(updated, 1);
    let batch = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert!(batch.is_expired);

    // Item operations never touch the batch's cached fields.
    let item = services
        .inventory
        .record_scan(scan_input(batch.id))
        .await
        .expect("record scan");
    assert_eq!(item.status, "in_stock");

    let item = services
        .inventory
        .set_status(item.id, "shipped")
        .await
        .expect("set status");
    assert_eq!(item.status, "shipped");

    let batch = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert!(batch.is_expired);
    assert_eq!(batch.priority_level, 3);
}

/// Sweeping twice with the same clock yields zero changes the second time.
#[tokio::test]
async fn sweep_is_idempotent() {
    let app = TestApp::new().await;
    let services = &app.state.services;

    let product_id = Uuid::parse_str(&app.create_product("Yoghurt", None).await).unwrap();
    let now = Utc::now();

    for (i, days) in [-3i64, -1, 4].iter().enumerate() {
        services
            .batches
            .create_batch(
                CreateBatchInput {
                    product_id,
                    batch_number: format!("LOT-{i}"),
                    manufacturing_date: None,
                    expiry_date: (now + Duration::days(*days)).date_naive(),
                    quantity: None,
                },
                now,
            )
            .await
            .expect("create batch");
    }

    let first = services.expiry.sweep_expired(now).await.unwrap();
    assert_eq!(first, 2);
    let second = services.expiry.sweep_expired(now).await.unwrap();
    assert_eq!(second, 0);
}

/// Once expired, nothing in the core resets the flag, including the
/// on-demand priority refresh.
#[tokio::test]
async fn expired_flag_is_monotonic() {
    let app = TestApp::new().await;
    let services = &app.state.services;

    let product_id = Uuid::parse_str(&app.create_product("Cream", None).await).unwrap();
    let now = Utc::now();

    let batch = services
        .batches
        .create_batch(
            CreateBatchInput {
                product_id,
                batch_number: "LOT-EXP".to_string(),
                manufacturing_date: None,
                expiry_date: (now - Duration::days(2)).date_naive(),
                quantity: None,
            },
            now,
        )
        .await
        .unwrap();

    assert_eq!(services.expiry.sweep_expired(now).await.unwrap(), 1);
    let swept = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert!(swept.is_expired);

    services.expiry.refresh_priorities(now).await.unwrap();
    services.expiry.sweep_expired(now).await.unwrap();

    let still = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert!(still.is_expired);
}

/// The refresh recomputes tiers from the new clock without touching batches
/// whose tier is unchanged.
#[tokio::test]
async fn priority_refresh_recomputes_stale_tiers() {
    let app = TestApp::new().await;
    let services = &app.state.services;

    let product_id = Uuid::parse_str(&app.create_product("Cheese", None).await).unwrap();
    let now = Utc::now();

    let batch = services
        .batches
        .create_batch(
            CreateBatchInput {
                product_id,
                batch_number: "LOT-STALE".to_string(),
                manufacturing_date: None,
                expiry_date: (now + Duration::days(100)).date_naive(),
                quantity: None,
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(batch.priority_level, 0);

    // 95 days later the snapshot is stale; the refresh moves it to critical.
    let later = now + Duration::days(95);
    let updated = services.expiry.refresh_priorities(later).await.unwrap();
    assert_eq!(updated, 1);

    let refreshed = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert_eq!(refreshed.priority_level, 3);
    assert!(!refreshed.is_expired);

    // Same clock again: nothing left to change.
    assert_eq!(services.expiry.refresh_priorities(later).await.unwrap(), 0);
}

/// Aggregate stock counts only items whose status is exactly in_stock.
#[tokio::test]
async fn aggregate_stock_counts_in_stock_items() {
    let app = TestApp::new().await;
    let services = &app.state.services;

    let product_id = Uuid::parse_str(&app.create_product("Butter", None).await).unwrap();
    let now = Utc::now();

    let batch = services
        .batches
        .create_batch(
            CreateBatchInput {
                product_id,
                batch_number: "LOT-AGG".to_string(),
                manufacturing_date: None,
                expiry_date: (now + Duration::days(20)).date_naive(),
                quantity: None,
            },
            now,
        )
        .await
        .unwrap();

    let a = services.inventory.record_scan(scan_input(batch.id)).await.unwrap();
    let _b = services.inventory.record_scan(scan_input(batch.id)).await.unwrap();
    let _c = services.inventory.record_scan(scan_input(batch.id)).await.unwrap();

    services.inventory.set_status(a.id, "shipped").await.unwrap();

    assert_eq!(services.expiry.aggregate_stock(batch.id).await.unwrap(), 2);

    // The listing exposes the same aggregate.
    let listed = services.batches.get_batch(batch.id).await.unwrap().unwrap();
    assert_eq!(listed.item_count, 2);
}
