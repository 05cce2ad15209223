use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    handlers::common::{actor_from_headers, success_response},
    services::sync::SyncOperation,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncRequest {
    pub operations: Vec<SyncOperation>,
}

/// Create the sync router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(submit_operations))
        .route("/pending", get(list_pending))
}

/// Submit offline operations for replay
#[utoipa::path(
    post,
    path = "/api/v1/sync/sync",
    request_body = SyncRequest,
    responses(
        (status = 200, description = "Sync report returned", body = crate::services::sync::SyncReport)
    ),
    tag = "sync"
)]
pub(crate) async fn submit_operations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SyncRequest>,
) -> Result<Response, ServiceError> {
    let report = state
        .services
        .sync
        .enqueue_operations(actor_from_headers(&headers), payload.operations)
        .await?;

    Ok(success_response(report))
}

/// List pending sync operations for the calling user
#[utoipa::path(
    get,
    path = "/api/v1/sync/pending",
    responses(
        (status = 200, description = "Pending operations returned")
    ),
    tag = "sync"
)]
pub(crate) async fn list_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let pending = state
        .services
        .sync
        .list_pending(actor_from_headers(&headers))
        .await?;

    Ok(success_response(pending))
}
