//! shelftrack API library
//!
//! Backend for perishable-goods tracking: products, batches with expiry
//! classification and priority tiers, scan-driven inventory movements, and
//! the supporting audit trail and offline sync queue.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Builds state over an established pool and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Composes the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::router())
        .nest("/api/v1/products", handlers::products::router())
        .nest("/api/v1/batches", handlers::batches::router())
        .nest("/api/v1/inventory", handlers::inventory::router())
        .nest("/api/v1/audit", handlers::audit::router())
        .nest("/api/v1/sync", handlers::sync::router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .with_state(state)
}
