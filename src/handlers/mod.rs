pub mod audit;
pub mod batches;
pub mod common;
pub mod health;
pub mod inventory;
pub mod products;
pub mod sync;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<crate::services::products::ProductService>,
    pub batches: Arc<crate::services::batches::BatchService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub expiry: Arc<crate::services::expiry::ExpiryEngine>,
    pub audit: Arc<crate::services::audit::AuditService>,
    pub sync: Arc<crate::services::sync::SyncService>,
}

impl AppServices {
    /// Builds the service container over a shared pool and event channel.
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let products = Arc::new(crate::services::products::ProductService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let batches = Arc::new(crate::services::batches::BatchService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let expiry = Arc::new(crate::services::expiry::ExpiryEngine::new(
            db_pool.clone(),
            event_sender,
        ));
        let audit = Arc::new(crate::services::audit::AuditService::new(db_pool.clone()));
        let sync = Arc::new(crate::services::sync::SyncService::new(db_pool));

        Self {
            products,
            batches,
            inventory,
            expiry,
            audit,
            sync,
        }
    }
}
