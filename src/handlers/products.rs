use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    handlers::common::{actor_from_headers, client_ip, created_response, success_response, validate_input},
    services::products::{CreateProductInput, UpdateProductInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 8, max = 14, message = "GTIN must be 8 to 14 characters"))]
    pub gtin: Option<String>,
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Create the products router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/gtin/:gtin", get(get_product_by_gtin))
        .route("/:id", get(get_product).put(update_product))
}

/// List products ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Product list returned")
    ),
    tag = "products"
)]
pub(crate) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, ServiceError> {
    let products = state
        .services
        .products
        .list_products(query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await?;

    Ok(success_response(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

    Ok(success_response(product))
}

/// Look up a product by GTIN (scanner flow)
#[utoipa::path(
    get,
    path = "/api/v1/products/gtin/{gtin}",
    params(("gtin" = String, Path, description = "Global Trade Item Number")),
    responses(
        (status = 200, description = "Product returned"),
        (status = 404, description = "No product with this GTIN", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub(crate) async fn get_product_by_gtin(
    State(state): State<AppState>,
    Path(gtin): Path<String>,
) -> Result<Response, ServiceError> {
    let product = state
        .services
        .products
        .get_product_by_gtin(&gtin)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No product with GTIN '{}'", gtin)))?;

    Ok(success_response(product))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "GTIN already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub(crate) async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(CreateProductInput {
            gtin: payload.gtin,
            name: payload.name,
            description: payload.description,
            manufacturer: payload.manufacturer,
            category: payload.category,
        })
        .await?;

    state
        .services
        .audit
        .record(
            actor_from_headers(&headers),
            "create",
            "product",
            Some(product.id.to_string()),
            Some(json!({ "name": product.name, "gtin": product.gtin })),
            client_ip(&headers),
        )
        .await;

    Ok(created_response(product))
}

/// Update a product in place
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub(crate) async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name.clone(),
                description: payload.description.clone(),
                manufacturer: payload.manufacturer.clone(),
                category: payload.category.clone(),
            },
        )
        .await?;

    state
        .services
        .audit
        .record(
            actor_from_headers(&headers),
            "update",
            "product",
            Some(id.to_string()),
            Some(json!({
                "name": payload.name,
                "description": payload.description,
                "manufacturer": payload.manufacturer,
                "category": payload.category,
            })),
            client_ip(&headers),
        )
        .await;

    Ok(success_response(product))
}
