use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    commands::{
        purchaseorders::{
            CreatePurchaseOrderCommand, PurchaseOrderDetails, PurchaseOrderInput,
            UpdatePurchaseOrderCommand,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{purchase_order, purchase_order_item, Currency, DocumentStatus, StatusFilter},
    services::{
        audit::{self, AuditAction, AuditEntry},
        lifecycle::{DocumentKind, LifecycleManager, StatusChange},
        price_history,
    },
};

/// Service for purchase orders (órdenes de compra)
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    lifecycle: Arc<LifecycleManager>,
    default_currency: Currency,
}

impl PurchaseOrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        lifecycle: Arc<LifecycleManager>,
        default_currency: Currency,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            lifecycle,
            default_currency,
        }
    }

    /// Orders matching the filter, newest number first
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list(
        &self,
        ctx: &AccountContext,
        filter: StatusFilter,
        supplier_id: Option<Uuid>,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        let mut query = purchase_order::Entity::find()
            .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
            .filter(purchase_order::Column::Status.is_in(filter.statuses()))
            .order_by_desc(purchase_order::Column::SequenceNumber);
        if let Some(supplier_id) = supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    /// Gets an order with its lines
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn get(
        &self,
        ctx: &AccountContext,
        id: Uuid,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = purchase_order::Entity::find_by_id(id)
            .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))?;

        let items = purchase_order_item::Entity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(id))
            .order_by_asc(purchase_order_item::Column::Position)
            .all(db)
            .await?;

        Ok(PurchaseOrderDetails::new(order, items))
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn create(
        &self,
        ctx: &AccountContext,
        mut input: PurchaseOrderInput,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        input.currency.get_or_insert(self.default_currency);
        CreatePurchaseOrderCommand {
            account: ctx.clone(),
            input,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn update(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        mut input: PurchaseOrderInput,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        input.currency.get_or_insert(self.default_currency);
        UpdatePurchaseOrderCommand {
            account: ctx.clone(),
            id,
            input,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    pub async fn set_status(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        status: DocumentStatus,
    ) -> Result<StatusChange, ServiceError> {
        self.lifecycle
            .set_status(ctx, DocumentKind::PurchaseOrder, id, status)
            .await
    }

    pub async fn archive(&self, ctx: &AccountContext, id: Uuid) -> Result<StatusChange, ServiceError> {
        self.lifecycle
            .archive(ctx, DocumentKind::PurchaseOrder, id)
            .await
    }

    pub async fn unarchive(
        &self,
        ctx: &AccountContext,
        id: Uuid,
    ) -> Result<StatusChange, ServiceError> {
        self.lifecycle
            .unarchive(ctx, DocumentKind::PurchaseOrder, id)
            .await
    }

    /// Hard delete, allowed for archived orders only. Lines and price history go with it.
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let order = purchase_order::Entity::find_by_id(id)
            .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))?;

        if order.status != DocumentStatus::Archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} must be archived before it can be deleted",
                order.order_number()
            )));
        }

        let txn = db.begin().await?;
        price_history::delete_for_order(&txn, ctx, id).await?;
        purchase_order_item::Entity::delete_many()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(id))
            .exec(&txn)
            .await?;
        purchase_order::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Delete,
                "purchase_orders",
                format!("Deleted purchase order {}", order.order_number()),
            )
            .record(id)
            .details(json!({ "sequence_number": order.sequence_number })),
        )
        .await;
        self.event_sender
            .send_or_log(Event::PurchaseOrderDeleted(id))
            .await;

        info!(purchase_order_id = %id, "Purchase order deleted");
        Ok(())
    }
}
