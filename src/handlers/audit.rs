use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    errors::ServiceError, handlers::common::success_response, services::audit::AuditFilter,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditListQuery {
    pub user_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub limit: Option<u64>,
}

/// Create the audit router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

/// List audit entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/audit",
    params(AuditListQuery),
    responses(
        (status = 200, description = "Audit entries returned")
    ),
    tag = "audit"
)]
pub(crate) async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<Response, ServiceError> {
    let entries = state
        .services
        .audit
        .list(AuditFilter {
            user_id: query.user_id,
            entity_type: query.entity_type,
            entity_id: query.entity_id,
            limit: query.limit,
        })
        .await?;

    Ok(success_response(entries))
}
