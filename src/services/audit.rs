use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::audit_log::{self, Entity as AuditLog},
    errors::ServiceError,
};

/// Filters for querying the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub limit: Option<u64>,
}

/// Audit trail writer/reader. Writes are best-effort: a failed audit insert
/// is logged and never fails the mutation it annotates.
#[derive(Clone)]
pub struct AuditService {
    db_pool: Arc<DbPool>,
}

impl AuditService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Records a successful mutation. Errors are swallowed after logging so
    /// the audit trail never breaks the request that produced it.
    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Option<String>,
        changes: Option<serde_json::Value>,
        ip_address: Option<String>,
    ) {
        let db = &*self.db_pool;

        let active = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            action: Set(action.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id),
            changes: Set(changes),
            ip_address: Set(ip_address),
            ..Default::default()
        };

        if let Err(e) = active.insert(db).await {
            warn!(action, entity_type, error = %e, "failed to write audit log entry");
        }
    }

    /// Lists audit entries newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: AuditFilter) -> Result<Vec<audit_log::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = AuditLog::find().order_by_desc(audit_log::Column::CreatedAt);

        if let Some(user_id) = filter.user_id {
            query = query.filter(audit_log::Column::UserId.eq(user_id));
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(audit_log::Column::EntityType.eq(entity_type));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit_log::Column::EntityId.eq(entity_id));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows = query.all(db).await?;
        Ok(rows)
    }
}
