use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    insert_items, next_sequence_number, order_totals, PurchaseOrderDetails, PurchaseOrderInput,
};
use crate::{
    auth::AccountContext,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{purchase_order, quote_request, DocumentStatus, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
        companies::find_company,
        price_history,
        suppliers::find_supplier,
    },
};

#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderCommand {
    pub account: AccountContext,
    pub input: PurchaseOrderInput,
}

#[async_trait]
impl Command for CreatePurchaseOrderCommand {
    type Result = PurchaseOrderDetails;

    #[instrument(skip(self, db_pool, event_sender), fields(account_id = %self.account.account_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let input = &self.input;
        input.check()?;
        let db = &*db_pool;

        let supplier = find_supplier(db, &self.account, input.supplier_id).await?;
        if supplier.status == SupplierStatus::Inactive {
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
        let now = Utc::now();

        let txn = db.begin().await?;
        let sequence_number = next_sequence_number(&txn, &self.account).await?;

        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(self.account.account_id),
            sequence_number: Set(sequence_number),
            supplier_id: Set(supplier.id),
            company_id: Set(input.company_id),
            quote_request_id: Set(input.quote_request_id),
            currency: Set(input.currency()),
            exchange_rate: Set(input.exchange_rate()),
            status: Set(DocumentStatus::Draft),
            delivery_date: Set(input.delivery_date),
            observations: Set(clean(input.observations.clone())),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            total_amount: Set(totals.total_amount),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(supplier_id = %supplier.id, error = %e, "Failed to insert purchase order");
            ServiceError::db_error(e)
        })?;

        let items = insert_items(&txn, order.id, &input.items).await?;
        txn.commit().await?;

        let recorded =
            price_history::replace_best_effort(db, &self.account, &order, &items).await;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Create,
                "purchase_orders",
                format!("Created purchase order {} for {}", order.order_number(), supplier.name),
            )
            .record(order.id)
            .details(json!({
                "sequence_number": sequence_number,
                "total_amount": order.total_amount,
                "currency": order.currency,
            })),
        )
        .await;

        event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                purchase_order_id: order.id,
                sequence_number,
            })
            .await;
        if recorded > 0 {
            event_sender
                .send_or_log(Event::PriceHistoryRecorded {
                    purchase_order_id: order.id,
                    entries: recorded,
                })
                .await;
        }

        metrics::counter!("procurement_purchase_orders.created", 1);
        info!(purchase_order_id = %order.id, sequence_number, "Purchase order created");

        Ok(PurchaseOrderDetails::new(order, items))
    }
}
