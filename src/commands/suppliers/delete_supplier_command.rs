use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{purchase_order, quote_request, supplier, supplier_material, technical_sheet},
    services::audit::{self, AuditAction, AuditEntry},
};

#[derive(Debug, Clone)]
pub struct DeleteSupplierCommand {
    pub account: AccountContext,
    pub id: Uuid,
}

#[async_trait]
impl Command for DeleteSupplierCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(account_id = %self.account.account_id, supplier_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = &*db_pool;
        let account_id = self.account.account_id;

        let existing = supplier::Entity::find_by_id(self.id)
            .filter(supplier::Column::AccountId.eq(account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Supplier", self.id))?;

        let quote_requests = quote_request::Entity::find()
            .filter(quote_request::Column::AccountId.eq(account_id))
            .filter(quote_request::Column::SupplierId.eq(self.id))
            .count(db)
            .await?;
        let purchase_orders = purchase_order::Entity::find()
            .filter(purchase_order::Column::AccountId.eq(account_id))
            .filter(purchase_order::Column::SupplierId.eq(self.id))
            .count(db)
            .await?;
        if quote_requests + purchase_orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Supplier {} has {} quote request(s) and {} purchase order(s); deactivate it instead",
                existing.code, quote_requests, purchase_orders
            )));
        }

        let txn = db.begin().await?;
        supplier_material::Entity::delete_many()
            .filter(supplier_material::Column::AccountId.eq(account_id))
            .filter(supplier_material::Column::SupplierId.eq(self.id))
            .exec(&txn)
            .await?;
        technical_sheet::Entity::delete_many()
            .filter(technical_sheet::Column::AccountId.eq(account_id))
            .filter(technical_sheet::Column::SupplierId.eq(self.id))
            .exec(&txn)
            .await?;
        supplier::Entity::delete_by_id(self.id).exec(&txn).await?;
        txn.commit().await?;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Delete,
                "suppliers",
                format!("Deleted supplier {} ({})", existing.name, existing.code),
            )
            .record(self.id)
            .details(json!({ "code": existing.code, "rif": existing.rif })),
        )
        .await;

        event_sender.send_or_log(Event::SupplierDeleted(self.id)).await;

        info!("Supplier deleted");
        Ok(())
    }
}
