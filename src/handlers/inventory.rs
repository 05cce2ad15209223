use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    entities::inventory_item::ItemStatus,
    errors::ServiceError,
    handlers::common::{actor_from_headers, client_ip, created_response, success_response},
    services::inventory::{ItemFilter, RecordScanInput},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Batch the scanned unit belongs to. Must already be resolved by the
    /// caller; a bare barcode is not translated into a batch here.
    pub batch_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub scanned_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of: in_stock, shipped, expired, damaged
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ItemListQuery {
    /// Filter by item status
    pub status: Option<String>,
    /// Filter by owning batch
    pub batch_id: Option<Uuid>,
    /// Maximum number of rows returned
    pub limit: Option<u64>,
}

/// Create the inventory router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/scan", post(record_scan))
        .route("/barcode/:code", get(find_by_barcode))
        .route("/:id", get(get_item))
        .route("/:id/status", put(update_status))
}

/// List inventory items with batch/product context
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Item list returned", body = [crate::services::inventory::ItemDetail]),
        (status = 400, description = "Invalid status filter", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub(crate) async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<Response, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;

    let items = state
        .services
        .inventory
        .list_items(ItemFilter {
            status,
            batch_id: query.batch_id,
            limit: query.limit,
        })
        .await?;

    Ok(success_response(items))
}

/// Record a scan event, creating an in-stock item under a batch
#[utoipa::path(
    post,
    path = "/api/v1/inventory/scan",
    request_body = ScanRequest,
    responses(
        (status = 201, description = "Item created", body = crate::services::inventory::ItemDetail),
        (status = 400, description = "Missing batch reference", body = crate::errors::ErrorResponse),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub(crate) async fn record_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ScanRequest>,
) -> Result<Response, ServiceError> {
    let batch_id = payload.batch_id.ok_or_else(|| {
        ServiceError::ValidationError(
            "batch_id is required; resolve the barcode to a batch before scanning".to_string(),
        )
    })?;

    let scanned_by = payload.scanned_by.or_else(|| actor_from_headers(&headers));

    let item = state
        .services
        .inventory
        .record_scan(RecordScanInput {
            batch_id,
            barcode: payload.barcode,
            qr_code: payload.qr_code,
            location: payload.location,
            notes: payload.notes,
            scanned_by,
        })
        .await?;

    state
        .services
        .audit
        .record(
            scanned_by,
            "scan",
            "inventory_item",
            Some(item.id.to_string()),
            Some(json!({ "batch_id": batch_id, "barcode": item.barcode })),
            client_ip(&headers),
        )
        .await;

    Ok(created_response(item))
}

/// Get an item by ID with batch/product context
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item returned", body = crate::services::inventory::ItemDetail),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub(crate) async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .inventory
        .get_item(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", id)))?;

    Ok(success_response(item))
}

/// Look up an item by barcode
#[utoipa::path(
    get,
    path = "/api/v1/inventory/barcode/{code}",
    params(("code" = String, Path, description = "Barcode value")),
    responses(
        (status = 200, description = "Item returned", body = crate::services::inventory::ItemDetail),
        (status = 404, description = "No item with this barcode", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub(crate) async fn find_by_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .inventory
        .find_by_barcode(&code)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No item with barcode '{}'", code)))?;

    Ok(success_response(item))
}

/// Update an item's status
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}/status",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Item updated", body = crate::services::inventory::ItemDetail),
        (status = 400, description = "Invalid status value", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub(crate) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .inventory
        .set_status(id, &payload.status)
        .await?;

    state
        .services
        .audit
        .record(
            actor_from_headers(&headers),
            "update_status",
            "inventory_item",
            Some(id.to_string()),
            Some(json!({ "status": payload.status })),
            client_ip(&headers),
        )
        .await;

    Ok(success_response(item))
}

fn parse_status(raw: &str) -> Result<ItemStatus, ServiceError> {
    ItemStatus::from_str(raw).map_err(|_| {
        ServiceError::InvalidStatus(format!(
            "'{}' is not a valid status (expected one of: in_stock, shipped, expired, damaged)",
            raw
        ))
    })
}
