use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use shelftrack_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventSender},
    AppState,
};

/// Helper harness spinning up application state backed by an in-memory
/// SQLite database. One connection only, so every request sees the same
/// database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("failed to migrate");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = shelftrack_api::app(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Issues a request and returns status plus parsed JSON body (Null when
    /// the body is empty or not JSON).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("x-user-id", user_id);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), None).await
    }

    /// Creates a product via the API and returns its id.
    pub async fn create_product(&self, name: &str, gtin: Option<&str>) -> String {
        let (status, body) = self
            .post(
                "/api/v1/products",
                serde_json::json!({ "name": name, "gtin": gtin }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create_product failed: {body}");
        body["id"].as_str().expect("product id").to_string()
    }

    /// Creates a batch via the API and returns the response body.
    pub async fn create_batch(
        &self,
        product_id: &str,
        batch_number: &str,
        expiry_date: &str,
    ) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/batches",
                serde_json::json!({
                    "product_id": product_id,
                    "batch_number": batch_number,
                    "expiry_date": expiry_date,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create_batch failed: {body}");
        body
    }
}
