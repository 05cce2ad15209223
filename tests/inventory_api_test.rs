mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

fn date_in(days: i64) -> String {
    (Utc::now() + Duration::days(days)).date_naive().to_string()
}

async fn seed_batch(app: &TestApp, name: &str, batch_number: &str, days: i64) -> String {
    let product_id = app.create_product(name, None).await;
    let batch = app.create_batch(&product_id, batch_number, &date_in(days)).await;
    batch["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn scan_requires_a_resolved_batch() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/v1/inventory/scan", json!({ "barcode": "123456" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (status, _) = app
        .post(
            "/api/v1/inventory/scan",
            json!({ "batch_id": Uuid::new_v4(), "barcode": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scan_creates_an_in_stock_item_with_context() {
    let app = TestApp::new().await;
    let batch_id = seed_batch(&app, "Smoked salmon", "LOT-S1", 4).await;

    let (status, body) = app
        .post(
            "/api/v1/inventory/scan",
            json!({
                "batch_id": batch_id,
                "barcode": "5901234123457",
                "location": "chiller-3",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "in_stock");
    assert_eq!(body["barcode"], "5901234123457");
    assert_eq!(body["location"], "chiller-3");
    assert_eq!(body["batch_number"], "LOT-S1");
    assert_eq!(body["product_name"], "Smoked salmon");
    assert_eq!(body["priority_level"], 3);
    assert_eq!(body["is_expired"], false);
}

#[tokio::test]
async fn scanned_by_falls_back_to_the_calling_user() {
    let app = TestApp::new().await;
    let batch_id = seed_batch(&app, "Prawns", "LOT-P1", 2).await;
    let user_id = Uuid::new_v4().to_string();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/inventory/scan",
            Some(json!({ "batch_id": batch_id })),
            Some(&user_id),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["scanned_by"], user_id.as_str());
}

#[tokio::test]
async fn any_status_can_move_to_any_status() {
    let app = TestApp::new().await;
    let batch_id = seed_batch(&app, "Chicken", "LOT-C1", 3).await;

    let (_, item) = app
        .post("/api/v1/inventory/scan", json!({ "batch_id": batch_id }))
        .await;
    let item_id = item["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/inventory/{item_id}/status");

    let statuses = ["in_stock", "shipped", "expired", "damaged"];
    for from in statuses {
        for to in statuses {
            let (status, _) = app.put(&uri, json!({ "status": from })).await;
            assert_eq!(status, StatusCode::OK, "setting {from}");
            let (status, body) = app.put(&uri, json!({ "status": to })).await;
            assert_eq!(status, StatusCode::OK, "{from} -> {to}");
            assert_eq!(body["status"], to);
        }
    }
}

#[tokio::test]
async fn unknown_status_values_are_rejected() {
    let app = TestApp::new().await;
    let batch_id = seed_batch(&app, "Turkey", "LOT-T1", 3).await;

    let (_, item) = app
        .post("/api/v1/inventory/scan", json!({ "batch_id": batch_id }))
        .await;
    let item_id = item["id"].as_str().unwrap();

    let (status, body) = app
        .put(
            &format!("/api/v1/inventory/{item_id}/status"),
            json!({ "status": "lost" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("lost"));

    // Item must still be in_stock.
    let (_, body) = app.get(&format!("/api/v1/inventory/{item_id}")).await;
    assert_eq!(body["status"], "in_stock");

    let (status, _) = app
        .put(
            &format!("/api/v1/inventory/{}/status", Uuid::new_v4()),
            json!({ "status": "shipped" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn barcode_lookup() {
    let app = TestApp::new().await;
    let batch_id = seed_batch(&app, "Ham", "LOT-H1", 10).await;

    app.post(
        "/api/v1/inventory/scan",
        json!({ "batch_id": batch_id, "barcode": "4006381333931" }),
    )
    .await;

    let (status, body) = app.get("/api/v1/inventory/barcode/4006381333931").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batch_number"], "LOT-H1");

    let (status, _) = app.get("/api/v1/inventory/barcode/0000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_items_filters_by_status_and_batch() {
    let app = TestApp::new().await;
    let batch_a = seed_batch(&app, "Salad", "LOT-A", 1).await;
    let batch_b = seed_batch(&app, "Soup", "LOT-B", 8).await;

    let (_, first) = app
        .post("/api/v1/inventory/scan", json!({ "batch_id": batch_a }))
        .await;
    app.post("/api/v1/inventory/scan", json!({ "batch_id": batch_a }))
        .await;
    app.post("/api/v1/inventory/scan", json!({ "batch_id": batch_b }))
        .await;

    app.put(
        &format!("/api/v1/inventory/{}/status", first["id"].as_str().unwrap()),
        json!({ "status": "shipped" }),
    )
    .await;

    let (status, body) = app.get("/api/v1/inventory").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    // Soonest-expiring batch first.
    assert_eq!(items[0]["batch_number"], "LOT-A");
    assert_eq!(items[2]["batch_number"], "LOT-B");

    let (_, body) = app.get("/api/v1/inventory?status=in_stock").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .get(&format!("/api/v1/inventory?batch_id={batch_a}&status=in_stock"))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/v1/inventory?status=misplaced").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sync_submission_reports_and_queues() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4().to_string();

    let (status, report) = app
        .request(
            Method::POST,
            "/api/v1/sync/sync",
            Some(json!({
                "operations": [
                    { "operation": "create", "entity_type": "inventory_item", "data": { "barcode": "123" } },
                    { "operation": "update", "entity_type": "batch", "data": { "quantity": 5 } },
                ]
            })),
            Some(&user_id),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["synced"].as_array().unwrap().len(), 2);
    assert_eq!(report["conflicts"].as_array().unwrap().len(), 0);
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    assert_eq!(report["synced"][0]["status"], "synced");

    // Pending queue is scoped to the calling user, oldest first.
    let (status, pending) = app
        .request(Method::GET, "/api/v1/sync/pending", None, Some(&user_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0]["operation"], "create");
    assert_eq!(pending[0]["sync_status"], "pending");

    let other_user = Uuid::new_v4().to_string();
    let (_, pending) = app
        .request(Method::GET, "/api/v1/sync/pending", None, Some(&other_user))
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_endpoint_reports_database_state() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");
    assert_eq!(body["database"]["message"], "connected");
}
