use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter as StrumEnumIter, EnumString};
use uuid::Uuid;

/// Inventory item entity: a physical unit (or scan record) belonging to
/// exactly one batch. Rows are created by scan events and cascade-deleted
/// with their batch.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub batch_id: Uuid,

    pub barcode: Option<String>,

    pub qr_code: Option<String>,

    /// One of the `ItemStatus` values, stored as its snake_case string
    pub status: String,

    /// Free-text storage location
    pub location: Option<String>,

    pub notes: Option<String>,

    /// User who performed the scan, when known
    pub scanned_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id",
        on_delete = "Cascade"
    )]
    Batch,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
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

        Ok(active_model)
    }
}

/// Status of a single inventory item.
///
/// The movement tracker deliberately imposes no transition graph: any status
/// may move to any other via an explicit update call. `can_transition_to` is
/// the single gate every update goes through, so a restriction table can be
/// slotted in later without touching call sites.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    StrumEnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    InStock,
    Shipped,
    Expired,
    Damaged,
}

impl ItemStatus {
    /// Initial status for freshly scanned items.
    pub fn default_status() -> Self {
        ItemStatus::InStock
    }

    /// Transition validation hook. Currently every pair is legal.
    pub fn can_transition_to(self, _next: ItemStatus) -> bool {
        true
    }
}
