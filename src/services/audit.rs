use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{auth::AccountContext, db::DbPool, errors::ServiceError, models::audit_log};

const MAX_PAGE: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    StatusChange,
    BulkArchive,
    BulkImport,
    DeleteAll,
    ResetSequence,
}

/// An audit-log line before it is written.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub description: String,
    pub details: serde_json::Value,
}

impl AuditEntry {
    pub fn new(action: AuditAction, table_name: &str, description: impl Into<String>) -> Self {
        Self {
            action,
            table_name: table_name.to_string(),
            record_id: None,
            description: description.into(),
            details: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn record(mut self, id: Uuid) -> Self {
        self.record_id = Some(id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Appends an entry. Audit writes never fail the operation being audited;
/// a failed insert is logged and counted.
pub async fn record<C>(db: &C, ctx: &AccountContext, entry: AuditEntry)
where
    C: ConnectionTrait,
{
    let action = entry.action;
    let table = entry.table_name.clone();

    let model = audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(ctx.account_id),
        action: Set(entry.action.to_string()),
        table_name: Set(entry.table_name),
        record_id: Set(entry.record_id),
        description: Set(entry.description),
        details: Set(entry.details),
        actor: Set(ctx.actor.clone()),
        created_at: Set(Utc::now()),
    };

    if let Err(e) = model.insert(db).await {
        warn!(%action, table = %table, error = %e, "Failed to append audit log entry");
        metrics::counter!("procurement_audit.write_failures", 1);
    }
}

/// Read side of the audit log
#[derive(Clone)]
pub struct AuditLogService {
    db_pool: Arc<DbPool>,
}

impl AuditLogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Most recent entries first, optionally restricted to one table
    #[instrument(skip(self))]
    pub async fn list_recent(
        &self,
        ctx: &AccountContext,
        table_name: Option<&str>,
        limit: u64,
    ) -> Result<Vec<audit_log::Model>, ServiceError> {
        let mut query = audit_log::Entity::find()
            .filter(audit_log::Column::AccountId.eq(ctx.account_id))
            .order_by_desc(audit_log::Column::CreatedAt)
            .limit(limit.clamp(1, MAX_PAGE));

        if let Some(table) = table_name.filter(|t| !t.trim().is_empty()) {
            query = query.filter(audit_log::Column::TableName.eq(table.trim()));
        }

        Ok(query.all(&*self.db_pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup_db;
    use serde_json::json;

    #[tokio::test]
    async fn entries_are_scoped_and_filtered_by_table() {
        let (_dir, db) = setup_db().await;
        let ctx = AccountContext::new(Uuid::new_v4(), "ana");
        let other = AccountContext::system(Uuid::new_v4());

        record(
            &*db,
            &ctx,
            AuditEntry::new(AuditAction::Create, "suppliers", "Created supplier P001")
                .record(Uuid::new_v4()),
        )
        .await;
        record(
            &*db,
            &ctx,
            AuditEntry::new(AuditAction::BulkImport, "materials", "Imported 3 materials")
                .details(json!({ "success_count": 3 })),
        )
        .await;
        record(&*db, &other, AuditEntry::new(AuditAction::Delete, "suppliers", "x")).await;

        let service = AuditLogService::new(db.clone());
        let all = service.list_recent(&ctx, None, 50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|e| e.actor == "ana"));

        let suppliers = service.list_recent(&ctx, Some("suppliers"), 50).await.unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].action, "CREATE");
    }

    #[test]
    fn actions_render_in_upper_snake_case() {
        assert_eq!(AuditAction::StatusChange.to_string(), "STATUS_CHANGE");
        assert_eq!(AuditAction::ResetSequence.to_string(), "RESET_SEQUENCE");
    }
}
