use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{insert_items, QuoteRequestDetails, QuoteRequestInput};
use crate::{
    auth::AccountContext,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{quote_request, DocumentStatus, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
        companies::find_company,
        suppliers::find_supplier,
    },
};

#[derive(Debug, Clone)]
pub struct CreateQuoteRequestCommand {
    pub account: AccountContext,
    pub input: QuoteRequestInput,
}

#[async_trait]
impl Command for CreateQuoteRequestCommand {
    type Result = QuoteRequestDetails;

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

        let now = Utc::now();
        let txn = db.begin().await?;
        let request = quote_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(self.account.account_id),
            supplier_id: Set(supplier.id),
            company_id: Set(input.company_id),
            currency: Set(input.currency()),
            exchange_rate: Set(input.exchange_rate()),
            status: Set(DocumentStatus::Draft),
            notes: Set(clean(input.notes.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(supplier_id = %supplier.id, error = %e, "Failed to insert quote request");
            ServiceError::db_error(e)
        })?;
        let items = insert_items(&txn, request.id, &input.items).await?;
        txn.commit().await?;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Create,
                "quote_requests",
                format!("Created quote request for {}", supplier.name),
            )
            .record(request.id)
            .details(json!({ "items": items.len(), "currency": request.currency })),
        )
        .await;

        event_sender
            .send_or_log(Event::QuoteRequestCreated(request.id))
            .await;

        metrics::counter!("procurement_quote_requests.created", 1);
        info!(quote_request_id = %request.id, "Quote request created");

        Ok(QuoteRequestDetails { request, items })
    }
}
