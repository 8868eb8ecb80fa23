use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::SupplierInput;
use crate::{
    auth::AccountContext,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{supplier, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        codes::next_code,
    },
};

#[derive(Debug, Clone)]
pub struct CreateSupplierCommand {
    pub account: AccountContext,
    pub input: SupplierInput,
}

#[async_trait]
impl Command for CreateSupplierCommand {
    type Result = supplier::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(account_id = %self.account.account_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (input, terms) = self.input.clone().prepare()?;
        let (payment_terms, credit_days, custom_payment_terms) = terms.into_columns();
        let db = &*db_pool;

        let txn = db.begin().await?;

        let existing: Vec<String> = supplier::Entity::find()
            .filter(supplier::Column::AccountId.eq(self.account.account_id))
            .select_only()
            .column(supplier::Column::Code)
            .into_tuple()
            .all(&txn)
            .await?;
        let code = next_code(supplier::CODE_PREFIX, &existing);

        let now = Utc::now();
        let created = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(self.account.account_id),
            code: Set(code),
            rif: Set(input.rif),
            name: Set(input.name),
            contact_name: Set(input.contact_name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            payment_terms: Set(payment_terms),
            credit_days: Set(credit_days),
            custom_payment_terms: Set(custom_payment_terms),
            status: Set(input.status.unwrap_or(SupplierStatus::Active)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Create,
                "suppliers",
                format!("Created supplier {} ({})", created.name, created.code),
            )
            .record(created.id)
            .details(json!({ "code": created.code, "rif": created.rif })),
        )
        .await;

        event_sender
            .send_or_log(Event::SupplierCreated(created.id))
            .await;

        info!(supplier_id = %created.id, code = %created.code, "Supplier created");
        Ok(created)
    }
}
