pub mod audit;
pub mod batches;
pub mod expiry;
pub mod inventory;
pub mod products;
pub mod sync;
