use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    commands::{
        quoterequests::{
            CreateQuoteRequestCommand, QuoteRequestDetails, QuoteRequestInput,
            UpdateQuoteRequestCommand,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{quote_request, quote_request_item, Currency, DocumentStatus, StatusFilter},
    services::{
        audit::{self, AuditAction, AuditEntry},
        lifecycle::{DocumentKind, LifecycleManager, StatusChange},
    },
};

/// Service for quote requests (solicitudes de cotización)
#[derive(Clone)]
pub struct QuoteRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    lifecycle: Arc<LifecycleManager>,
    default_currency: Currency,
}

impl QuoteRequestService {
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

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list(
        &self,
        ctx: &AccountContext,
        filter: StatusFilter,
        supplier_id: Option<Uuid>,
    ) -> Result<Vec<quote_request::Model>, ServiceError> {
        let mut query = quote_request::Entity::find()
            .filter(quote_request::Column::AccountId.eq(ctx.account_id))
            .filter(quote_request::Column::Status.is_in(filter.statuses()))
            .order_by_desc(quote_request::Column::CreatedAt);
        if let Some(supplier_id) = supplier_id {
            query = query.filter(quote_request::Column::SupplierId.eq(supplier_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn get(
        &self,
        ctx: &AccountContext,
        id: Uuid,
    ) -> Result<QuoteRequestDetails, ServiceError> {
        let db = &*self.db_pool;
        let request = find_quote_request(db, ctx, id).await?;
        let items = quote_request_item::Entity::find()
            .filter(quote_request_item::Column::QuoteRequestId.eq(id))
            .order_by_asc(quote_request_item::Column::Position)
            .all(db)
            .await?;
        Ok(QuoteRequestDetails { request, items })
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn create(
        &self,
        ctx: &AccountContext,
        mut input: QuoteRequestInput,
    ) -> Result<QuoteRequestDetails, ServiceError> {
        input.currency.get_or_insert(self.default_currency);
        CreateQuoteRequestCommand {
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
        mut input: QuoteRequestInput,
    ) -> Result<QuoteRequestDetails, ServiceError> {
        input.currency.get_or_insert(self.default_currency);
        UpdateQuoteRequestCommand {
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
            .set_status(ctx, DocumentKind::QuoteRequest, id, status)
            .await
    }

    pub async fn archive(&self, ctx: &AccountContext, id: Uuid) -> Result<StatusChange, ServiceError> {
        self.lifecycle.archive(ctx, DocumentKind::QuoteRequest, id).await
    }

    pub async fn unarchive(
        &self,
        ctx: &AccountContext,
        id: Uuid,
    ) -> Result<StatusChange, ServiceError> {
        self.lifecycle
            .unarchive(ctx, DocumentKind::QuoteRequest, id)
            .await
    }

    /// Hard delete of an archived request and its lines
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let request = find_quote_request(db, ctx, id).await?;
        if request.status != DocumentStatus::Archived {
            return Err(ServiceError::InvalidOperation(
                "Quote request must be archived before it can be deleted".to_string(),
            ));
        }

        let txn = db.begin().await?;
        quote_request_item::Entity::delete_many()
            .filter(quote_request_item::Column::QuoteRequestId.eq(id))
            .exec(&txn)
            .await?;
        quote_request::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(AuditAction::Delete, "quote_requests", "Deleted quote request")
                .record(id),
        )
        .await;
        self.event_sender
            .send_or_log(Event::QuoteRequestDeleted(id))
            .await;

        info!(quote_request_id = %id, "Quote request deleted");
        Ok(())
    }
}

pub(crate) async fn find_quote_request<C>(
    db: &C,
    ctx: &AccountContext,
    id: Uuid,
) -> Result<quote_request::Model, ServiceError>
where
    C: sea_orm::ConnectionTrait,
{
    quote_request::Entity::find_by_id(id)
        .filter(quote_request::Column::AccountId.eq(ctx.account_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote request", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        companies::{CompanyInput, CompanyService},
        suppliers::SupplierService,
        test_support::{event_sender, setup_db},
    };
    use crate::commands::suppliers::SupplierInput;
    use assert_matches::assert_matches;
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        service: QuoteRequestService,
        ctx: AccountContext,
        supplier_id: Uuid,
        company_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let (dir, db) = setup_db().await;
        let events = event_sender();
        let lifecycle = Arc::new(LifecycleManager::new(db.clone(), events.clone(), true));
        let ctx = AccountContext::system(Uuid::new_v4());

        let supplier_input: SupplierInput = serde_json::from_value(json!({
            "rif": "J-12345678-9",
            "name": "Ferretería Central"
        }))
        .unwrap();
        let supplier = SupplierService::new(db.clone(), events.clone(), lifecycle.clone())
            .create(&ctx, supplier_input)
            .await
            .unwrap();
        let company_input: CompanyInput = serde_json::from_value(json!({
            "rif": "J-98765432-1",
            "name": "Constructora Andina"
        }))
        .unwrap();
        let company = CompanyService::new(db.clone(), events.clone())
            .create(&ctx, company_input)
            .await
            .unwrap();

        Fixture {
            _dir: dir,
            service: QuoteRequestService::new(db, events, lifecycle, Currency::Usd),
            ctx,
            supplier_id: supplier.id,
            company_id: company.id,
        }
    }

    fn input(f: &Fixture, names: &[&str]) -> QuoteRequestInput {
        let items: Vec<_> = names
            .iter()
            .map(|name| json!({ "material_name": name, "quantity": 5.0, "unit": "kg" }))
            .collect();
        serde_json::from_value(json!({
            "supplier_id": f.supplier_id,
            "company_id": f.company_id,
            "items": items
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn update_replaces_the_lines() {
        let f = fixture().await;
        let created = f
            .service
            .create(&f.ctx, input(&f, &["Cemento", "Cabilla", "Arena"]))
            .await
            .unwrap();
        assert_eq!(created.items.len(), 3);
        assert_eq!(created.request.status, DocumentStatus::Draft);

        f.service
            .update(&f.ctx, created.request.id, input(&f, &["Bloque"]))
            .await
            .unwrap();
        let details = f.service.get(&f.ctx, created.request.id).await.unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].material_name, "Bloque");
        assert_eq!(details.items[0].position, 1);
    }

    #[tokio::test]
    async fn only_archived_requests_can_be_deleted() {
        let f = fixture().await;
        let created = f.service.create(&f.ctx, input(&f, &["Cemento"])).await.unwrap();
        let id = created.request.id;

        assert_matches!(
            f.service.delete(&f.ctx, id).await,
            Err(ServiceError::InvalidOperation(_))
        );

        f.service.archive(&f.ctx, id).await.unwrap();
        assert_matches!(
            f.service.update(&f.ctx, id, input(&f, &["Arena"])).await,
            Err(ServiceError::InvalidOperation(_))
        );

        f.service.delete(&f.ctx, id).await.unwrap();
        assert_matches!(f.service.get(&f.ctx, id).await, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn other_accounts_see_nothing() {
        let f = fixture().await;
        let created = f.service.create(&f.ctx, input(&f, &["Cemento"])).await.unwrap();
        let stranger = AccountContext::system(Uuid::new_v4());

        assert_matches!(
            f.service.get(&stranger, created.request.id).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(f
            .service
            .list(&stranger, StatusFilter::All, None)
            .await
            .unwrap()
            .is_empty());
    }
}
