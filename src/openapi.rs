use utoipa::OpenApi;

/// OpenAPI document for the shelftrack HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "shelftrack-api",
        description = "Expiry-tracking inventory API: products, batches, scan-driven inventory movements and the expiry sweep."
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_gtin,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::batches::list_batches,
        crate::handlers::batches::get_batch,
        crate::handlers::batches::create_batch,
        crate::handlers::batches::update_expired,
        crate::handlers::batches::refresh_priorities,
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::record_scan,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::find_by_barcode,
        crate::handlers::inventory::update_status,
        crate::handlers::audit::list_audit_logs,
        crate::handlers::sync::submit_operations,
        crate::handlers::sync::list_pending,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::products::CreateProductRequest,
        crate::handlers::products::UpdateProductRequest,
        crate::handlers::batches::CreateBatchRequest,
        crate::handlers::batches::SweepResponse,
        crate::handlers::inventory::ScanRequest,
        crate::handlers::inventory::UpdateStatusRequest,
        crate::handlers::sync::SyncRequest,
        crate::services::batches::BatchSummary,
        crate::services::inventory::ItemDetail,
        crate::services::sync::SyncOperation,
        crate::services::sync::SyncAck,
        crate::services::sync::SyncFailure,
        crate::services::sync::SyncReport,
    )),
    tags(
        (name = "products", description = "Product identity management"),
        (name = "batches", description = "Batch registration, expiry sweep and priority tiers"),
        (name = "inventory", description = "Scan events and item status transitions"),
        (name = "audit", description = "Change history"),
        (name = "sync", description = "Offline operation queue")
    )
)]
pub struct ApiDoc;
