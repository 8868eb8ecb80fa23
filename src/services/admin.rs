use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, QueryTrait, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        company, material, price_history, purchase_order, purchase_order_item,
        purchase_order_sequence, quote_comparison, quote_comparison_item, quote_request,
        quote_request_item, supplier, supplier_material, technical_sheet,
    },
    services::audit::{self, AuditAction, AuditEntry},
};

/// Data sets that can be wiped in one go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DataType {
    Suppliers,
    Materials,
    QuoteRequests,
    PurchaseOrders,
    PriceHistory,
    Companies,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResult {
    pub data_type: DataType,
    /// Rows removed from the data set itself, children not included
    pub deleted: u64,
}

/// Destructive account maintenance, gated by the configured PIN
#[derive(Clone)]
pub struct AdminService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    admin_pin: Option<String>,
}

impl AdminService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        admin_pin: Option<String>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            admin_pin,
        }
    }

    fn verify_pin(&self, ctx: &AccountContext, pin: &str) -> Result<(), ServiceError> {
        match self.admin_pin.as_deref() {
            None => Err(ServiceError::Forbidden(
                "Administrative actions are disabled".to_string(),
            )),
            Some(expected) if expected == pin.trim() => Ok(()),
            Some(_) => {
                warn!(account_id = %ctx.account_id, actor = %ctx.actor, "Rejected admin PIN");
                Err(ServiceError::Forbidden("Invalid PIN".to_string()))
            }
        }
    }

    /// Deletes every row of `data_type` in the account along with rows that
    /// depend on it.
    #[instrument(skip(self, ctx, pin), fields(account_id = %ctx.account_id))]
    pub async fn delete_all(
        &self,
        ctx: &AccountContext,
        pin: &str,
        data_type: DataType,
    ) -> Result<PurgeResult, ServiceError> {
        self.verify_pin(ctx, pin)?;
        let db = &*self.db_pool;
        let account_id = ctx.account_id;

        let txn = db.begin().await?;
        let deleted = match data_type {
            DataType::Suppliers => {
                purge_quote_requests(&txn, account_id).await?;
                purge_purchase_orders(&txn, account_id).await?;
                purge_quote_comparisons(&txn, account_id).await?;
                supplier_material::Entity::delete_many()
                    .filter(supplier_material::Column::AccountId.eq(account_id))
                    .exec(&txn)
                    .await?;
                technical_sheet::Entity::delete_many()
                    .filter(technical_sheet::Column::AccountId.eq(account_id))
                    .exec(&txn)
                    .await?;
                supplier::Entity::delete_many()
                    .filter(supplier::Column::AccountId.eq(account_id))
                    .exec(&txn)
                    .await?
                    .rows_affected
            }
            DataType::Materials => {
                supplier_material::Entity::delete_many()
                    .filter(supplier_material::Column::AccountId.eq(account_id))
                    .exec(&txn)
                    .await?;
                purge_price_history(&txn, account_id).await?;
                detach_material_references(&txn, account_id).await?;
                material::Entity::delete_many()
                    .filter(material::Column::AccountId.eq(account_id))
                    .exec(&txn)
                    .await?
                    .rows_affected
            }
            DataType::QuoteRequests => purge_quote_requests(&txn, account_id).await?,
            DataType::PurchaseOrders => purge_purchase_orders(&txn, account_id).await?,
            DataType::PriceHistory => purge_price_history(&txn, account_id).await?,
            DataType::Companies => {
                let in_use = quote_request::Entity::find()
                    .filter(quote_request::Column::AccountId.eq(account_id))
                    .count(&txn)
                    .await?
                    + purchase_order::Entity::find()
                        .filter(purchase_order::Column::AccountId.eq(account_id))
                        .count(&txn)
                        .await?;
                if in_use > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "{} documents still reference companies; delete them first",
                        in_use
                    )));
                }
                company::Entity::delete_many()
                    .filter(company::Column::AccountId.eq(account_id))
                    .exec(&txn)
                    .await?
                    .rows_affected
            }
        };
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::DeleteAll,
                &data_type.to_string(),
                format!("Deleted all {} ({} rows)", data_type, deleted),
            )
            .details(json!({ "deleted": deleted })),
        )
        .await;
        self.event_sender
            .send_or_log(Event::DataPurged {
                account_id,
                data_type: data_type.to_string(),
                deleted,
            })
            .await;

        Ok(PurgeResult { data_type, deleted })
    }

    /// Restarts purchase-order numbering at 1
    #[instrument(skip(self, ctx, pin), fields(account_id = %ctx.account_id))]
    pub async fn reset_sequence(&self, ctx: &AccountContext, pin: &str) -> Result<(), ServiceError> {
        self.verify_pin(ctx, pin)?;
        let db = &*self.db_pool;

        purchase_order_sequence::Entity::update_many()
            .col_expr(purchase_order_sequence::Column::LastValue, Expr::value(0i64))
            .col_expr(purchase_order_sequence::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(purchase_order_sequence::Column::AccountId.eq(ctx.account_id))
            .exec(db)
            .await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::ResetSequence,
                "purchase_order_sequences",
                "Reset purchase order numbering",
            ),
        )
        .await;
        self.event_sender
            .send_or_log(Event::PurchaseOrderSequenceReset(ctx.account_id))
            .await;
        Ok(())
    }
}

async fn purge_quote_requests<C>(txn: &C, account_id: Uuid) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let owned = quote_request::Entity::find()
        .select_only()
        .column(quote_request::Column::Id)
        .filter(quote_request::Column::AccountId.eq(account_id))
        .into_query();
    quote_request_item::Entity::delete_many()
        .filter(quote_request_item::Column::QuoteRequestId.in_subquery(owned))
        .exec(txn)
        .await?;
    purchase_order::Entity::update_many()
        .col_expr(
            purchase_order::Column::QuoteRequestId,
            Expr::value(Option::<Uuid>::None),
        )
        .filter(purchase_order::Column::AccountId.eq(account_id))
        .exec(txn)
        .await?;
    Ok(quote_request::Entity::delete_many()
        .filter(quote_request::Column::AccountId.eq(account_id))
        .exec(txn)
        .await?
        .rows_affected)
}

async fn purge_purchase_orders<C>(db: &C, account_id: Uuid) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let owned = purchase_order::Entity::find()
        .select_only()
        .column(purchase_order::Column::Id)
        .filter(purchase_order::Column::AccountId.eq(account_id))
        .into_query();
    purge_price_history(db, account_id).await?;
    purchase_order_item::Entity::delete_many()
        .filter(purchase_order_item::Column::PurchaseOrderId.in_subquery(owned))
        .exec(db)
        .await?;
    Ok(purchase_order::Entity::delete_many()
        .filter(purchase_order::Column::AccountId.eq(account_id))
        .exec(db)
        .await?
        .rows_affected)
}

async fn purge_quote_comparisons<C>(db: &C, account_id: Uuid) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let owned = quote_comparison::Entity::find()
        .select_only()
        .column(quote_comparison::Column::Id)
        .filter(quote_comparison::Column::AccountId.eq(account_id))
        .into_query();
    quote_comparison_item::Entity::delete_many()
        .filter(quote_comparison_item::Column::QuoteComparisonId.in_subquery(owned))
        .exec(db)
        .await?;
    Ok(quote_comparison::Entity::delete_many()
        .filter(quote_comparison::Column::AccountId.eq(account_id))
        .exec(db)
        .await?
        .rows_affected)
}

async fn purge_price_history<C>(db: &C, account_id: Uuid) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(price_history::Entity::delete_many()
        .filter(price_history::Column::AccountId.eq(account_id))
        .exec(db)
        .await?
        .rows_affected)
}

/// Document lines and sheets keep their text but drop the material link
async fn detach_material_references<C>(db: &C, account_id: Uuid) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let orders = purchase_order::Entity::find()
        .select_only()
        .column(purchase_order::Column::Id)
        .filter(purchase_order::Column::AccountId.eq(account_id))
        .into_query();
    purchase_order_item::Entity::update_many()
        .col_expr(
            purchase_order_item::Column::MaterialId,
            Expr::value(Option::<Uuid>::None),
        )
        .filter(purchase_order_item::Column::PurchaseOrderId.in_subquery(orders))
        .exec(db)
        .await?;

    let requests = quote_request::Entity::find()
        .select_only()
        .column(quote_request::Column::Id)
        .filter(quote_request::Column::AccountId.eq(account_id))
        .into_query();
    quote_request_item::Entity::update_many()
        .col_expr(
            quote_request_item::Column::MaterialId,
            Expr::value(Option::<Uuid>::None),
        )
        .filter(quote_request_item::Column::QuoteRequestId.in_subquery(requests))
        .exec(db)
        .await?;

    technical_sheet::Entity::update_many()
        .col_expr(
            technical_sheet::Column::MaterialId,
            Expr::value(Option::<Uuid>::None),
        )
        .filter(technical_sheet::Column::AccountId.eq(account_id))
        .exec(db)
        .await?;
    Ok(())
}
