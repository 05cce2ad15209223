use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Batch entity: a production lot of a product sharing one expiry date.
///
/// `is_expired` and `priority_level` are caches owned by the expiry engine:
/// `is_expired` only moves false -> true (via the sweep), and `priority_level`
/// is a point-in-time snapshot computed at creation or on an explicit refresh.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning product
    pub product_id: Uuid,

    /// Lot identifier, unique per product
    #[validate(length(
        min = 1,
        max = 100,
        message = "Batch number must be between 1 and 100 characters"
    ))]
    pub batch_number: String,

    pub manufacturing_date: Option<NaiveDate>,

    /// Shared expiry date for every unit in the lot
    pub expiry_date: NaiveDate,

    /// Nominal unit count, independent of actual inventory item rows
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,

    /// Derived, one-directional: set true by the expiry sweep, never reset
    pub is_expired: bool,

    /// Derived urgency tier 0-3, snapshot from days-to-expiry
    pub priority_level: i16,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::inventory_item::Entity")]
    InventoryItems,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            active_model.created_at = Set(Utc::now());
        }
        active_model.updated_at = Set(Utc::now());

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
