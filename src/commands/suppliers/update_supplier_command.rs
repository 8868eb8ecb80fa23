use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::Serialize;
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
    services::audit::{self, AuditAction, AuditEntry},
};

#[derive(Debug, Clone)]
pub struct UpdateSupplierCommand {
    pub account: AccountContext,
    pub id: Uuid,
    pub input: SupplierInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSupplierResult {
    pub supplier: supplier::Model,
    pub previous_status: SupplierStatus,
}

impl UpdateSupplierResult {
    /// True when this update moved the supplier from Active to Inactive
    pub fn deactivated(&self) -> bool {
        self.previous_status == SupplierStatus::Active
            && self.supplier.status == SupplierStatus::Inactive
    }
}

#[async_trait]
impl Command for UpdateSupplierCommand {
    type Result = UpdateSupplierResult;

    #[instrument(skip(self, db_pool, event_sender), fields(account_id = %self.account.account_id, supplier_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (input, terms) = self.input.clone().prepare()?;
        let (payment_terms, credit_days, custom_payment_terms) = terms.into_columns();
        let db = &*db_pool;

        let current = supplier::Entity::find_by_id(self.id)
            .filter(supplier::Column::AccountId.eq(self.account.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Supplier", self.id))?;

        let previous_status = current.status;
        let new_status = input.status.unwrap_or(previous_status);

        let mut active = current.into_active_model();
        active.rif = Set(input.rif);
        active.name = Set(input.name);
        active.contact_name = Set(input.contact_name);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.address = Set(input.address);
        active.payment_terms = Set(payment_terms);
        active.credit_days = Set(credit_days);
        active.custom_payment_terms = Set(custom_payment_terms);
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;

        audit::record(
            db,
            &self.account,
            AuditEntry::new(
                AuditAction::Update,
                "suppliers",
                format!("Updated supplier {} ({})", updated.name, updated.code),
            )
            .record(updated.id)
            .details(json!({ "status": updated.status })),
        )
        .await;

        event_sender
            .send_or_log(Event::SupplierUpdated(updated.id))
            .await;
        if previous_status != new_status {
            event_sender
                .send_or_log(Event::SupplierStatusChanged {
                    supplier_id: updated.id,
                    old_status: previous_status.to_string(),
                    new_status: new_status.to_string(),
                })
                .await;
        }

        info!(supplier_id = %updated.id, "Supplier updated");
        Ok(UpdateSupplierResult {
            supplier: updated,
            previous_status,
        })
    }
}
