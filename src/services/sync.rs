use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::sync_queue::{self, Entity as SyncQueue},
    errors::ServiceError,
};

/// One offline operation captured by a client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncOperation {
    pub operation: String,
    pub entity_type: String,
    pub data: serde_json::Value,
}

/// Per-operation acknowledgement in the sync report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncAck {
    pub operation: String,
    pub entity_type: String,
    pub status: String,
}

/// Per-operation failure in the sync report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncFailure {
    pub operation: String,
    pub error: String,
}

/// Result report for a sync submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SyncReport {
    pub synced: Vec<SyncAck>,
    pub conflicts: Vec<SyncAck>,
    pub errors: Vec<SyncFailure>,
}

/// Offline sync queue: enqueues operations submitted by reconnecting clients
/// and reports per-operation outcomes. Conflict resolution is not implemented;
/// every enqueued operation is acknowledged as synced.
#[derive(Clone)]
pub struct SyncService {
    db_pool: Arc<DbPool>,
}

impl SyncService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Enqueues a list of offline operations for a user, building the
    /// per-operation result report. A failed enqueue lands in `errors`
    /// without aborting the rest of the submission.
    #[instrument(skip(self, operations))]
    pub async fn enqueue_operations(
        &self,
        user_id: Option<Uuid>,
        operations: Vec<SyncOperation>,
    ) -> Result<SyncReport, ServiceError> {
        let db = &*self.db_pool;
        let mut report = SyncReport::default();

        for op in operations {
            let active = sync_queue::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                operation: Set(op.operation.clone()),
                entity_type: Set(op.entity_type.clone()),
                entity_data: Set(op.data.clone()),
                sync_status: Set("pending".to_string()),
                processed_at: Set(None),
                ..Default::default()
            };

            match active.insert(db).await {
                Ok(_) => report.synced.push(SyncAck {
                    operation: op.operation,
                    entity_type: op.entity_type,
                    status: "synced".to_string(),
                }),
                Err(e) => report.errors.push(SyncFailure {
                    operation: op.operation,
                    error: e.to_string(),
                }),
            }
        }

        Ok(report)
    }

    /// Lists a user's pending operations, oldest first.
    #[instrument(skip(self))]
    pub async fn list_pending(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<sync_queue::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = SyncQueue::find()
            .filter(sync_queue::Column::SyncStatus.eq("pending"))
            .order_by_asc(sync_queue::Column::CreatedAt);

        if let Some(user_id) = user_id {
            query = query.filter(sync_queue::Column::UserId.eq(user_id));
        }

        let rows = query.all(db).await?;
        Ok(rows)
    }
}
