use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    handlers::common::{actor_from_headers, client_ip, created_response, success_response, validate_input},
    services::batches::{BatchFilter, CreateBatchInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBatchRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "batch_number must be 1 to 100 characters"))]
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub quantity: Option<i32>,
    /// Accepted for client compatibility but never stored as-is; the tier is
    /// always recomputed from the expiry date before the response is returned.
    pub priority_level: Option<i16>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BatchListQuery {
    /// Filter on the expired flag
    pub expired: Option<bool>,
    /// Maximum number of rows returned
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepResponse {
    pub message: String,
    pub updated: u64,
}

/// Create the batches router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_batches).post(create_batch))
        .route("/update-expired", post(update_expired))
        .route("/refresh-priorities", post(refresh_priorities))
        .route("/:id", get(get_batch))
}

/// List batches, soonest-expiring first, with in-stock item counts
#[utoipa::path(
    get,
    path = "/api/v1/batches",
    params(BatchListQuery),
    responses(
        (status = 200, description = "Batch list returned", body = [crate::services::batches::BatchSummary])
    ),
    tag = "batches"
)]
pub(crate) async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchListQuery>,
) -> Result<Response, ServiceError> {
    let batches = state
        .services
        .batches
        .list_batches(BatchFilter {
            expired: query.expired,
            limit: query.limit,
        })
        .await?;

    Ok(success_response(batches))
}

/// Get a batch by ID
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}",
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch returned", body = crate::services::batches::BatchSummary),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub(crate) async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let batch = state
        .services
        .batches
        .get_batch(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", id)))?;

    Ok(success_response(batch))
}

/// Register a new batch; priority is computed before the response is returned
#[utoipa::path(
    post,
    path = "/api/v1/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = crate::services::batches::BatchSummary),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Batch number already exists for this product", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub(crate) async fn create_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    let batch = state
        .services
        .batches
        .create_batch(
            CreateBatchInput {
                product_id: payload.product_id,
                batch_number: payload.batch_number,
                manufacturing_date: payload.manufacturing_date,
                expiry_date: payload.expiry_date,
                quantity: payload.quantity,
            },
            Utc::now(),
        )
        .await?;

    state
        .services
        .audit
        .record(
            actor_from_headers(&headers),
            "create",
            "batch",
            Some(batch.id.to_string()),
            Some(json!({
                "batch_number": batch.batch_number,
                "expiry_date": batch.expiry_date,
                "priority_level": batch.priority_level,
            })),
            client_ip(&headers),
        )
        .await;

    Ok(created_response(batch))
}

/// Sweep all batches, flipping the expired flag where the expiry date has passed
#[utoipa::path(
    post,
    path = "/api/v1/batches/update-expired",
    responses(
        (status = 200, description = "Sweep completed", body = SweepResponse)
    ),
    tag = "batches"
)]
pub(crate) async fn update_expired(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let updated = state.services.expiry.sweep_expired(Utc::now()).await?;

    state
        .services
        .audit
        .record(
            actor_from_headers(&headers),
            "sweep",
            "batch",
            None,
            Some(json!({ "updated": updated })),
            client_ip(&headers),
        )
        .await;

    Ok(success_response(SweepResponse {
        message: "Expired batches updated".to_string(),
        updated,
    }))
}

/// Recompute priority tiers for all batches from the current time
#[utoipa::path(
    post,
    path = "/api/v1/batches/refresh-priorities",
    responses(
        (status = 200, description = "Priorities recomputed", body = SweepResponse)
    ),
    tag = "batches"
)]
pub(crate) async fn refresh_priorities(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let updated = state.services.expiry.refresh_priorities(Utc::now()).await?;

    state
        .services
        .audit
        .record(
            actor_from_headers(&headers),
            "refresh_priorities",
            "batch",
            None,
            Some(json!({ "updated": updated })),
            client_ip(&headers),
        )
        .await;

    Ok(success_response(SweepResponse {
        message: "Batch priorities refreshed".to_string(),
        updated,
    }))
}
