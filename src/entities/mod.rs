pub mod audit_log;
pub mod batch;
pub mod inventory_item;
pub mod product;
pub mod sync_queue;
