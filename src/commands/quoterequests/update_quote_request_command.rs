use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{insert_items, QuoteRequestDetails, QuoteRequestInput};
use crate::{
    auth::AccountContext,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{quote_request, quote_request_item, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
        companies::find_company,
        suppliers::find_supplier,
    },
};

/// Rewrites an editable quote request; its lines are replaced wholesale
#[derive(Debug, Clone)]
pub struct UpdateQuoteRequestCommand {
    pub account: AccountContext,
    pub id: Uuid,
    pub input: QuoteRequestInput,
}

#[async_trait]
impl Command for UpdateQuoteRequestCommand {
    type Result = QuoteRequestDetails;

    #[instrument(skip(self, db_pool, event_sender), fields(account_id = %self.account.account_id, quote_request_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let input = &self.input;
        input.check()?;
        let db = &*db_pool;

        let current = quote_request::Entity::find_by_id(self.id)
            .filter(quote_request::Column::AccountId.eq(self.account.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quote request", self.id))?;
        if !current.status.is_editable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Quote request is {} and can no longer be edited",
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

        let read_status = current.status;
        let txn = db.begin().await?;
        let mut active = current.into_active_model();
        active.supplier_id = Set(supplier.id);
        active.company_id = Set(input.company_id);
        active.currency = Set(input.currency());
        active.exchange_rate = Set(input.exchange_rate());
        active.notes = Set(clean(input.notes.clone()));
        active.updated_at = Set(Utc::now());
        let written = quote_request::Entity::update_many()
            .set(active)
            .filter(quote_request::Column::Id.eq(self.id))
            .filter(quote_request::Column::AccountId.eq(self.account.account_id))
            .filter(quote_request::Column::Status.eq(read_status))
            .exec(&txn)
            .await?;
        if written.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Quote request changed status while it was being edited".into(),
            ));
        }
        let request = quote_request::Entity::find_by_id(self.id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quote request", self.id))?;

        quote_request_item::Entity::delete_many()
            .filter(quote_request_item::Column::QuoteRequestId.eq(request.id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, request.id, &input.items).await?;
        txn.commit().await?;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Update,
                "quote_requests",
                format!("Updated quote request for {}", supplier.name),
            )
            .record(request.id),
        )
        .await;

        event_sender
            .send_or_log(Event::QuoteRequestUpdated(request.id))
            .await;

        info!(items = items.len(), "Quote request updated");
        Ok(QuoteRequestDetails { request, items })
    }
}
