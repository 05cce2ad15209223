use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::{
    error::SqlErr, ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        batch::{self, Entity as Batch},
        inventory_item::{self, ItemStatus},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::expiry,
};

/// Input for registering a new batch.
#[derive(Debug, Clone)]
pub struct CreateBatchInput {
    pub product_id: Uuid,
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub quantity: Option<i32>,
}

/// Batch row joined with its product identity and the live in-stock count.
/// The count is aggregated at read time and never cached on the batch.
#[derive(Debug, Clone, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
    pub is_expired: bool,
    pub priority_level: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_name: String,
    pub gtin: Option<String>,
    pub item_count: i64,
}

/// Filters for the batch listing.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    pub expired: Option<bool>,
    pub limit: Option<u64>,
}

/// Service for registering and listing batches. Derived fields on the rows it
/// writes (`priority_level` at creation) come from the expiry engine's pure
/// functions; the sweep itself lives on `ExpiryEngine`.
#[derive(Clone)]
pub struct BatchService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl BatchService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a new batch under an existing product.
    ///
    /// Priority is computed synchronously from `now` before the row is
    /// returned; `is_expired` always starts false and is only ever flipped by
    /// the sweep. Duplicate `(product_id, batch_number)` pairs are a conflict
    /// and leave the store unchanged.
    #[instrument(skip(self))]
    pub async fn create_batch(
        &self,
        input: CreateBatchInput,
        now: DateTime<Utc>,
    ) -> Result<BatchSummary, ServiceError> {
        let db = &*self.db_pool;

        if input.batch_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "batch_number must not be empty".to_string(),
            ));
        }

        let product = Product::find_by_id(input.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let existing = Batch::find()
            .filter(batch::Column::ProductId.eq(input.product_id))
            .filter(batch::Column::BatchNumber.eq(input.batch_number.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Batch '{}' already exists for product '{}'",
                input.batch_number, product.name
            )));
        }

        let batch_id = Uuid::new_v4();
        let priority = expiry::compute_priority(input.expiry_date, now);

        let active = batch::ActiveModel {
            id: Set(batch_id),
            product_id: Set(input.product_id),
            batch_number: Set(input.batch_number.clone()),
            manufacturing_date: Set(input.manufacturing_date),
            expiry_date: Set(input.expiry_date),
            quantity: Set(input.quantity.unwrap_or(0)),
            is_expired: Set(false),
            priority_level: Set(priority),
            ..Default::default()
        };

        // The unique index backs up the pre-check under concurrent creates.
        active.insert(db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict(format!(
                    "Batch '{}' already exists for product '{}'",
                    input.batch_number, product.name
                ))
            } else {
                ServiceError::from(e)
            }
        })?;

        self.event_sender
            .send(Event::BatchCreated {
                batch_id,
                product_id: input.product_id,
                priority_level: priority,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            batch_id = %batch_id,
            batch_number = %input.batch_number,
            priority_level = priority,
            "Batch created"
        );

        self.get_batch(batch_id).await?.ok_or_else(|| {
            error!(batch_id = %batch_id, "batch vanished immediately after insert");
            ServiceError::InternalError("Created batch could not be read back".to_string())
        })
    }

    /// Fetches a single batch joined with product fields and in-stock count.
    #[instrument(skip(self))]
    pub async fn get_batch(&self, id: Uuid) -> Result<Option<BatchSummary>, ServiceError> {
        let db = &*self.db_pool;

        let row = summary_query()
            .filter(batch::Column::Id.eq(id))
            .into_model::<BatchSummary>()
            .one(db)
            .await?;

        Ok(row)
    }

    /// Lists batches soonest-expiring first (id ascending as tiebreak), with
    /// an optional expired filter and limit.
    #[instrument(skip(self))]
    pub async fn list_batches(&self, filter: BatchFilter) -> Result<Vec<BatchSummary>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = summary_query();

        if let Some(expired) = filter.expired {
            query = query.filter(batch::Column::IsExpired.eq(expired));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows = query.into_model::<BatchSummary>().all(db).await?;

        Ok(rows)
    }
}

/// Shared select for `BatchSummary`: batches joined to products, left-joined
/// to their in-stock items for the count aggregate.
fn summary_query() -> sea_orm::Select<Batch> {
    Batch::find()
        .select_only()
        .columns([
            batch::Column::Id,
            batch::Column::ProductId,
            batch::Column::BatchNumber,
            batch::Column::ManufacturingDate,
            batch::Column::ExpiryDate,
            batch::Column::Quantity,
            batch::Column::IsExpired,
            batch::Column::PriorityLevel,
            batch::Column::CreatedAt,
            batch::Column::UpdatedAt,
        ])
        .column_as(product::Column::Name, "product_name")
        .column_as(product::Column::Gtin, "gtin")
        .column_as(inventory_item::Column::Id.count(), "item_count")
        .join(JoinType::InnerJoin, batch::Relation::Product.def())
        .join(
            JoinType::LeftJoin,
            batch::Relation::InventoryItems.def().on_condition(|_left, right| {
                Expr::col((right, inventory_item::Column::Status))
                    .eq(ItemStatus::InStock.as_ref())
                    .into_condition()
            }),
        )
        .group_by(batch::Column::Id)
        .group_by(batch::Column::ProductId)
        .group_by(batch::Column::BatchNumber)
        .group_by(batch::Column::ManufacturingDate)
        .group_by(batch::Column::ExpiryDate)
        .group_by(batch::Column::Quantity)
        .group_by(batch::Column::IsExpired)
        .group_by(batch::Column::PriorityLevel)
        .group_by(batch::Column::CreatedAt)
        .group_by(batch::Column::UpdatedAt)
        .group_by(product::Column::Name)
        .group_by(product::Column::Gtin)
        .order_by_asc(batch::Column::ExpiryDate)
        .order_by_asc(batch::Column::Id)
}
