use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        batch::{self, Entity as Batch},
        inventory_item::{self, Entity as InventoryItem, ItemStatus},
        product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Input for recording a scan event against a batch.
///
/// The batch reference must already be resolved by the caller; this service
/// does not translate a bare barcode into a batch.
#[derive(Debug, Clone)]
pub struct RecordScanInput {
    pub batch_id: Uuid,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub scanned_by: Option<Uuid>,
}

/// Inventory item joined with batch and product display fields. The joined
/// fields are read-time context, never stored redundantly on the item row.
#[derive(Debug, Clone, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct ItemDetail {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub status: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub scanned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub is_expired: bool,
    pub priority_level: i16,
    pub product_name: String,
    pub gtin: Option<String>,
}

/// Filters for the item listing.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    pub batch_id: Option<Uuid>,
    pub limit: Option<u64>,
}

/// The inventory movement tracker: records scan events that create items
/// against a batch and applies item status transitions.
///
/// Creating or transitioning an item never mutates the parent batch's cached
/// `is_expired`/`priority_level`; those stay owned by the expiry engine and
/// update on their own triggers.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an inventory item from a scan event, defaulted to `in_stock`.
    /// Fails with not-found if the referenced batch does not exist.
    #[instrument(skip(self))]
    pub async fn record_scan(&self, input: RecordScanInput) -> Result<ItemDetail, ServiceError> {
        let db = &*self.db_pool;

        let batch_exists = Batch::find_by_id(input.batch_id).one(db).await?.is_some();
        if !batch_exists {
            return Err(ServiceError::NotFound(format!(
                "Batch {} not found",
                input.batch_id
            )));
        }

        let item_id = Uuid::new_v4();
        let active = inventory_item::ActiveModel {
            id: Set(item_id),
            batch_id: Set(input.batch_id),
            barcode: Set(input.barcode),
            qr_code: Set(input.qr_code),
            status: Set(ItemStatus::default_status().to_string()),
            location: Set(input.location),
            notes: Set(input.notes),
            scanned_by: Set(input.scanned_by),
            ..Default::default()
        };

        active.insert(db).await?;

        self.event_sender
            .send(Event::ItemScanned {
                item_id,
                batch_id: input.batch_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(item_id = %item_id, batch_id = %input.batch_id, "Scan recorded");

        self.get_item(item_id).await?.ok_or_else(|| {
            ServiceError::InternalError("Created item could not be read back".to_string())
        })
    }

    /// Applies a status transition to an item.
    ///
    /// The requested value must parse as one of the four statuses; the
    /// transition itself goes through `ItemStatus::can_transition_to`, which
    /// today allows every pair.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        item_id: Uuid,
        requested: &str,
    ) -> Result<ItemDetail, ServiceError> {
        let db = &*self.db_pool;

        let new_status = ItemStatus::from_str(requested).map_err(|_| {
            ServiceError::InvalidStatus(format!(
                "'{}' is not a valid status (expected one of: in_stock, shipped, expired, damaged)",
                requested
            ))
        })?;

        let item = InventoryItem::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))?;

        let old_status = item.status.clone();
        if let Ok(current) = ItemStatus::from_str(&old_status) {
            if !current.can_transition_to(new_status) {
                return Err(ServiceError::InvalidStatus(format!(
                    "Transition from '{}' to '{}' is not allowed",
                    old_status, new_status
                )));
            }
        }

        let mut active: inventory_item::ActiveModel = item.into();
        active.status = Set(new_status.to_string());
        active.update(db).await?;

        self.event_sender
            .send(Event::ItemStatusChanged {
                item_id,
                old_status,
                new_status: new_status.to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(item_id = %item_id, status = %new_status, "Item status updated");

        self.get_item(item_id).await?.ok_or_else(|| {
            ServiceError::InternalError("Updated item could not be read back".to_string())
        })
    }

    /// Fetches a single item with its batch/product context.
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: Uuid) -> Result<Option<ItemDetail>, ServiceError> {
        let db = &*self.db_pool;

        let row = detail_query()
            .filter(inventory_item::Column::Id.eq(id))
            .into_model::<ItemDetail>()
            .one(db)
            .await?;

        Ok(row)
    }

    /// Single-item lookup by barcode, for the scanner flow.
    #[instrument(skip(self))]
    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<ItemDetail>, ServiceError> {
        let db = &*self.db_pool;

        let row = detail_query()
            .filter(inventory_item::Column::Barcode.eq(barcode))
            .into_model::<ItemDetail>()
            .one(db)
            .await?;

        Ok(row)
    }

    /// Lists items ordered by batch expiry ascending, then batch priority
    /// descending, with optional status/batch filters.
    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<ItemDetail>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = detail_query();

        if let Some(status) = filter.status {
            query = query.filter(inventory_item::Column::Status.eq(status.as_ref()));
        }
        if let Some(batch_id) = filter.batch_id {
            query = query.filter(inventory_item::Column::BatchId.eq(batch_id));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows = query.into_model::<ItemDetail>().all(db).await?;

        Ok(rows)
    }
}

/// Shared select for `ItemDetail`: items joined through their batch to the
/// owning product.
fn detail_query() -> sea_orm::Select<InventoryItem> {
    InventoryItem::find()
        .select_only()
        .columns([
            inventory_item::Column::Id,
            inventory_item::Column::BatchId,
            inventory_item::Column::Barcode,
            inventory_item::Column::QrCode,
            inventory_item::Column::Status,
            inventory_item::Column::Location,
            inventory_item::Column::Notes,
            inventory_item::Column::ScannedBy,
            inventory_item::Column::CreatedAt,
            inventory_item::Column::UpdatedAt,
        ])
        .column_as(batch::Column::BatchNumber, "batch_number")
        .column_as(batch::Column::ExpiryDate, "expiry_date")
        .column_as(batch::Column::IsExpired, "is_expired")
        .column_as(batch::Column::PriorityLevel, "priority_level")
        .column_as(product::Column::Name, "product_name")
        .column_as(product::Column::Gtin, "gtin")
        .join(JoinType::InnerJoin, inventory_item::Relation::Batch.def())
        .join(JoinType::InnerJoin, batch::Relation::Product.def())
        .order_by_asc(batch::Column::ExpiryDate)
        .order_by_desc(batch::Column::PriorityLevel)
}
