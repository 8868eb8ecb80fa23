use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{insert_items, order_totals, PurchaseOrderDetails, PurchaseOrderInput};
use crate::{
    auth::AccountContext,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{purchase_order, purchase_order_item, quote_request, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
        companies::find_company,
        price_history,
        suppliers::find_supplier,
    },
};

/// Replaces the header fields and every line of an editable order
#[derive(Debug, Clone)]
pub struct UpdatePurchaseOrderCommand {
    pub account: AccountContext,
    pub id: Uuid,
    pub input: PurchaseOrderInput,
}

#[async_trait]
impl Command for UpdatePurchaseOrderCommand {
    type Result = PurchaseOrderDetails;

    #[instrument(skip(self, db_pool, event_sender), fields(account_id = %self.account.account_id, purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let input = &self.input;
        input.check()?;
        let db = &*db_pool;

        let current = purchase_order::Entity::find_by_id(self.id)
            .filter(purchase_order::Column::AccountId.eq(self.account.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", self.id))?;
        if !current.status.is_editable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} is {} and can no longer be edited",
                current.order_number(),
                current.status
            )));
        }

        let supplier = find_supplier(db, &self.account, input.supplier_id).await?;
        if supplier.id != current.supplier_id && supplier.status == SupplierStatus::Inactive {
            return Err(ServiceError::InvalidOperation(format!(
                "Supplier {} is inactive",
                supplier.code
            )));
        }
        find_company(db, &self.account, input.company_id).await?;
        if let Some(quote_request_id) = input.quote_request_id {
            quote_request::Entity::find_by_id(quote_request_id)
                .filter(quote_request::Column::AccountId.eq(self.account.account_id))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Quote request", quote_request_id))?;
        }

        let totals = order_totals(&input.items)?;

        let read_status = current.status;
        let order_number = current.order_number();

        let txn = db.begin().await?;
        let mut active = current.into_active_model();
        active.supplier_id = Set(supplier.id);
        active.company_id = Set(input.company_id);
        active.quote_request_id = Set(input.quote_request_id);
        active.currency = Set(input.currency());
        active.exchange_rate = Set(input.exchange_rate());
        active.delivery_date = Set(input.delivery_date);
        active.observations = Set(clean(input.observations.clone()));
        active.subtotal = Set(totals.subtotal);
        active.tax_amount = Set(totals.tax_amount);
        active.total_amount = Set(totals.total_amount);
        active.updated_at = Set(Utc::now());
        let written = purchase_order::Entity::update_many()
            .set(active)
            .filter(purchase_order::Column::Id.eq(self.id))
            .filter(purchase_order::Column::AccountId.eq(self.account.account_id))
            .filter(purchase_order::Column::Status.eq(read_status))
            .exec(&txn)
            .await?;
        if written.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Purchase order {} changed status while it was being edited",
                order_number
            )));
        }
        let order = purchase_order::Entity::find_by_id(self.id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", self.id))?;

        purchase_order_item::Entity::delete_many()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(order.id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, order.id, &input.items).await?;
        txn.commit().await?;

        let recorded =
            price_history::replace_best_effort(db, &self.account, &order, &items).await;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Update,
                "purchase_orders",
                format!("Updated purchase order {}", order.order_number()),
            )
            .record(order.id)
            .details(json!({
                "items": items.len(),
                "total_amount": order.total_amount,
                "price_history_entries": recorded,
            })),
        )
        .await;

        event_sender
            .send_or_log(Event::PurchaseOrderUpdated(order.id))
            .await;

        info!(items = items.len(), "Purchase order updated");
        Ok(PurchaseOrderDetails::new(order, items))
    }
}
