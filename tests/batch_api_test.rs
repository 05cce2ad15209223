mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

fn date_in(days: i64) -> String {
    (Utc::now() + Duration::days(days)).date_naive().to_string()
}

#[tokio::test]
async fn create_batch_returns_joined_summary() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Semi-skimmed milk", Some("04012345678901")).await;

    let (status, body) = app
        .post(
            "/api/v1/batches",
            json!({
                "product_id": product_id,
                "batch_number": "LOT-2026-08",
                "expiry_date": date_in(5),
                "quantity": 24,
                // Client-supplied tier is ignored; the computed one wins.
                "priority_level": 0,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["batch_number"], "LOT-2026-08");
    assert_eq!(body["priority_level"], 3);
    assert_eq!(body["is_expired"], false);
    assert_eq!(body["product_name"], "Semi-skimmed milk");
    assert_eq!(body["gtin"], "04012345678901");
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn duplicate_batch_number_conflicts_per_product() {
    let app = TestApp::new().await;
    let product_a = app.create_product("Cheddar", None).await;
    let product_b = app.create_product("Brie", None).await;

    app.create_batch(&product_a, "LOT-1", &date_in(30)).await;

    let (status, body) = app
        .post(
            "/api/v1/batches",
            json!({
                "product_id": product_a,
                "batch_number": "LOT-1",
                "expiry_date": date_in(40),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    // The same batch number under another product is fine.
    let (status, _) = app
        .post(
            "/api/v1/batches",
            json!({
                "product_id": product_b,
                "batch_number": "LOT-1",
                "expiry_date": date_in(40),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn create_batch_rejects_bad_input() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Eggs", None).await;

    // Unknown product.
    let (status, _) = app
        .post(
            "/api/v1/batches",
            json!({
                "product_id": Uuid::new_v4(),
                "batch_number": "LOT-X",
                "expiry_date": date_in(10),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Empty batch number.
    let (status, body) = app
        .post(
            "/api/v1/batches",
            json!({
                "product_id": product_id,
                "batch_number": "",
                "expiry_date": date_in(10),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    // Missing expiry date is rejected before it reaches the service.
    let (status, _) = app
        .post(
            "/api/v1/batches",
            json!({ "product_id": product_id, "batch_number": "LOT-X" }),
        )
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn list_batches_orders_by_expiry_and_filters() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Yoghurt", None).await;

    app.create_batch(&product_id, "LOT-FAR", &date_in(60)).await;
    app.create_batch(&product_id, "LOT-NEAR", &date_in(2)).await;
    app.create_batch(&product_id, "LOT-GONE", &date_in(-3)).await;

    let (status, body) = app.post("/api/v1/batches/update-expired", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (status, body) = app.get("/api/v1/batches").await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["batch_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["LOT-GONE", "LOT-NEAR", "LOT-FAR"]);

    let (_, body) = app.get("/api/v1/batches?expired=true").await;
    let expired: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["batch_number"].as_str().unwrap())
        .collect();
    assert_eq!(expired, vec!["LOT-GONE"]);

    let (_, body) = app.get("/api/v1/batches?expired=false&limit=1").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["batch_number"], "LOT-NEAR");
}

#[tokio::test]
async fn get_batch_by_id() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Butter", None).await;
    let created = app.create_batch(&product_id, "LOT-9", &date_in(45)).await;

    let (status, body) = app
        .get(&format!("/api/v1/batches/{}", created["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batch_number"], "LOT-9");
    assert_eq!(body["priority_level"], 1);

    let (status, _) = app.get(&format!("/api/v1/batches/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sweep_endpoint_is_idempotent() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Cream", None).await;
    app.create_batch(&product_id, "LOT-OLD", &date_in(-1)).await;

    let (status, body) = app.post("/api/v1/batches/update-expired", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
    assert_eq!(body["message"], "Expired batches updated");

    let (_, body) = app.post("/api/v1/batches/update-expired", json!({})).await;
    assert_eq!(body["updated"], 0);
}

#[tokio::test]
async fn refresh_priorities_endpoint() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Juice", None).await;
    app.create_batch(&product_id, "LOT-J", &date_in(120)).await;

    // Snapshots are already current, so nothing changes.
    let (status, body) = app.post("/api/v1/batches/refresh-priorities", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 0);
    assert_eq!(body["message"], "Batch priorities refreshed");
}

#[tokio::test]
async fn product_gtin_is_unique_and_queryable() {
    let app = TestApp::new().await;
    app.create_product("Oat drink", Some("07310865004703")).await;

    let (status, body) = app
        .post(
            "/api/v1/products",
            json!({ "name": "Oat drink clone", "gtin": "07310865004703" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = app.get("/api/v1/products/gtin/07310865004703").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Oat drink");

    let (status, _) = app.get("/api/v1/products/gtin/00000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutations_leave_an_audit_trail() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4().to_string();

    let (status, product) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Audited ham" })),
            Some(&user_id),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().unwrap();

    let (status, batch) = app
        .request(
            Method::POST,
            "/api/v1/batches",
            Some(json!({
                "product_id": product_id,
                "batch_number": "LOT-A",
                "expiry_date": date_in(3),
            })),
            Some(&user_id),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, entries) = app
        .get(&format!("/api/v1/audit?user_id={user_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    // Newest first.
    assert_eq!(entries[0]["action"], "create");
    assert_eq!(entries[0]["entity_type"], "batch");
    assert_eq!(entries[0]["entity_id"], batch["id"]);
    assert_eq!(entries[1]["entity_type"], "product");

    let (_, filtered) = app
        .get(&format!("/api/v1/audit?entity_type=batch&user_id={user_id}"))
        .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
}
