use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use strum::Display;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{purchase_order, quote_request, supplier, DocumentStatus},
    services::audit::{self, AuditAction, AuditEntry},
};

/// The two documents that move through the status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[strum(to_string = "quote request")]
    QuoteRequest,
    #[strum(to_string = "purchase order")]
    PurchaseOrder,
}

impl DocumentKind {
    pub fn table_name(self) -> &'static str {
        match self {
            DocumentKind::QuoteRequest => "quote_requests",
            DocumentKind::PurchaseOrder => "purchase_orders",
        }
    }

    /// Rejected only exists for purchase orders
    pub fn supports(self, status: DocumentStatus) -> bool {
        !(self == DocumentKind::QuoteRequest && status == DocumentStatus::Rejected)
    }
}

/// Whether moving `from` -> `to` is allowed. Staying put is always allowed.
pub fn is_allowed_transition(kind: DocumentKind, from: DocumentStatus, to: DocumentStatus) -> bool {
    use DocumentStatus::*;

    if !kind.supports(to) {
        return false;
    }
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Draft, Sent)
            | (Draft, Archived)
            | (Sent, Draft)
            | (Sent, Approved)
            | (Sent, Rejected)
            | (Sent, Archived)
            | (Rejected, Draft)
            | (Rejected, Archived)
            | (Archived, Draft)
    )
}

/// Result of a status write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub document_id: Uuid,
    pub kind: DocumentKind,
    pub old_status: DocumentStatus,
    pub new_status: DocumentStatus,
    /// False when the document already had the requested status
    pub changed: bool,
}

/// Documents archived when a supplier is deactivated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveCounts {
    pub quote_requests: u64,
    pub purchase_orders: u64,
}

impl ArchiveCounts {
    pub fn total(&self) -> u64 {
        self.quote_requests + self.purchase_orders
    }
}

/// Applies status changes to quote requests and purchase orders.
#[derive(Clone)]
pub struct LifecycleManager {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    enforce_transitions: bool,
}

impl LifecycleManager {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        enforce_transitions: bool,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            enforce_transitions,
        }
    }

    pub fn enforces_transitions(&self) -> bool {
        self.enforce_transitions
    }

    /// Checks a move against the transition table, honouring the enforcement switch.
    pub fn check_transition(
        &self,
        kind: DocumentKind,
        from: DocumentStatus,
        to: DocumentStatus,
    ) -> Result<(), ServiceError> {
        if !kind.supports(to) {
            return Err(ServiceError::ValidationError(format!(
                "A {} cannot be {}",
                kind, to
            )));
        }
        if self.enforce_transitions && !is_allowed_transition(kind, from, to) {
            return Err(ServiceError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// Moves a document to `new_status`.
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn set_status(
        &self,
        ctx: &AccountContext,
        kind: DocumentKind,
        id: Uuid,
        new_status: DocumentStatus,
    ) -> Result<StatusChange, ServiceError> {
        let old_status = current_status(&*self.db_pool, ctx, kind, id).await?;
        self.transition(ctx, kind, id, old_status, new_status).await
    }

    /// Moves a document from `old_status` to `new_status`. Fails with a
    /// conflict when the stored status is no longer `old_status`.
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn transition(
        &self,
        ctx: &AccountContext,
        kind: DocumentKind,
        id: Uuid,
        old_status: DocumentStatus,
        new_status: DocumentStatus,
    ) -> Result<StatusChange, ServiceError> {
        let db = &*self.db_pool;
        self.check_transition(kind, old_status, new_status)?;

        if old_status == new_status {
            return Ok(StatusChange {
                document_id: id,
                kind,
                old_status,
                new_status,
                changed: false,
            });
        }

        write_status(db, ctx, kind, id, old_status, new_status).await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::StatusChange,
                kind.table_name(),
                format!("Changed {} status from {} to {}", kind, old_status, new_status),
            )
            .record(id)
            .details(json!({ "from": old_status, "to": new_status })),
        )
        .await;

        self.event_sender
            .send_or_log(Event::DocumentStatusChanged {
                document_type: kind.table_name().to_string(),
                document_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        metrics::counter!("procurement_documents.status_transitions", 1);
        info!(%id, %old_status, %new_status, "Document status changed");

        Ok(StatusChange {
            document_id: id,
            kind,
            old_status,
            new_status,
            changed: true,
        })
    }

    pub async fn archive(
        &self,
        ctx: &AccountContext,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<StatusChange, ServiceError> {
        self.set_status(ctx, kind, id, DocumentStatus::Archived).await
    }

    /// Restores an archived document; it always comes back as a draft.
    pub async fn unarchive(
        &self,
        ctx: &AccountContext,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<StatusChange, ServiceError> {
        self.set_status(ctx, kind, id, DocumentStatus::Draft).await
    }

    /// Archives every open document of a supplier: one UPDATE per document type.
    /// Approved and already archived documents are left alone, so repeating
    /// the call changes nothing.
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn bulk_archive_by_supplier(
        &self,
        ctx: &AccountContext,
        supplier_id: Uuid,
    ) -> Result<ArchiveCounts, ServiceError> {
        let db = &*self.db_pool;

        let exists = supplier::Entity::find_by_id(supplier_id)
            .filter(supplier::Column::AccountId.eq(ctx.account_id))
            .select_only()
            .column(supplier::Column::Id)
            .into_tuple::<Uuid>()
            .one(db)
            .await?;
        if exists.is_none() {
            return Err(ServiceError::not_found("Supplier", supplier_id));
        }

        let untouched = [DocumentStatus::Archived, DocumentStatus::Approved];
        let archived = DocumentStatus::Archived.to_value();
        let now = Utc::now();

        let txn = db.begin().await?;

        let quote_requests = quote_request::Entity::update_many()
            .col_expr(quote_request::Column::Status, Expr::value(archived.clone()))
            .col_expr(quote_request::Column::UpdatedAt, Expr::value(now))
            .filter(quote_request::Column::AccountId.eq(ctx.account_id))
            .filter(quote_request::Column::SupplierId.eq(supplier_id))
            .filter(quote_request::Column::Status.is_not_in(untouched))
            .exec(&txn)
            .await?
            .rows_affected;

        let purchase_orders = purchase_order::Entity::update_many()
            .col_expr(purchase_order::Column::Status, Expr::value(archived))
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
            .filter(purchase_order::Column::SupplierId.eq(supplier_id))
            .filter(purchase_order::Column::Status.is_not_in(untouched))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        let counts = ArchiveCounts {
            quote_requests,
            purchase_orders,
        };

        for (kind, count) in [
            (DocumentKind::QuoteRequest, counts.quote_requests),
            (DocumentKind::PurchaseOrder, counts.purchase_orders),
        ] {
            if count == 0 {
                continue;
            }
            audit::record(
                db,
                ctx,
                AuditEntry::new(
                    AuditAction::BulkArchive,
                    kind.table_name(),
                    format!("Archived {} {}(s) of deactivated supplier", count, kind),
                )
                .details(json!({ "supplier_id": supplier_id, "count": count })),
            )
            .await;
        }

        if counts.total() > 0 {
            metrics::counter!("procurement_documents.archived", counts.total());
            self.event_sender
                .send_or_log(Event::SupplierDocumentsArchived {
                    supplier_id,
                    quote_requests: counts.quote_requests,
                    purchase_orders: counts.purchase_orders,
                })
                .await;
        }

        info!(
            %supplier_id,
            quote_requests = counts.quote_requests,
            purchase_orders = counts.purchase_orders,
            "Supplier documents archived"
        );
        Ok(counts)
    }

    /// Runs the bulk archive for a freshly deactivated supplier. A failure is
    /// reported as a warning; the supplier change itself stands.
    pub async fn archive_after_deactivation(
        &self,
        ctx: &AccountContext,
        supplier_id: Uuid,
    ) -> (ArchiveCounts, Option<String>) {
        match self.bulk_archive_by_supplier(ctx, supplier_id).await {
            Ok(counts) => (counts, None),
            Err(e) => {
                warn!(%supplier_id, error = %e, "Bulk archive after deactivation failed");
                (
                    ArchiveCounts::default(),
                    Some(format!(
                        "Supplier deactivated, but its documents could not be archived: {}",
                        e.response_message()
                    )),
                )
            }
        }
    }
}

/// Status of a document owned by the caller's account
pub(crate) async fn current_status<C>(
    db: &C,
    ctx: &AccountContext,
    kind: DocumentKind,
    id: Uuid,
) -> Result<DocumentStatus, ServiceError>
where
    C: ConnectionTrait,
{
    let status = match kind {
        DocumentKind::QuoteRequest => {
            quote_request::Entity::find_by_id(id)
                .filter(quote_request::Column::AccountId.eq(ctx.account_id))
                .one(db)
                .await?
                .map(|q| q.status)
        }
        DocumentKind::PurchaseOrder => {
            purchase_order::Entity::find_by_id(id)
                .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
                .one(db)
                .await?
                .map(|p| p.status)
        }
    };

    status.ok_or_else(|| match kind {
        DocumentKind::QuoteRequest => ServiceError::not_found("Quote request", id),
        DocumentKind::PurchaseOrder => ServiceError::not_found("Purchase order", id),
    })
}

async fn write_status<C>(
    db: &C,
    ctx: &AccountContext,
    kind: DocumentKind,
    id: Uuid,
    from: DocumentStatus,
    to: DocumentStatus,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let result = match kind {
        DocumentKind::QuoteRequest => {
            quote_request::Entity::update_many()
                .col_expr(quote_request::Column::Status, Expr::value(to.to_value()))
                .col_expr(quote_request::Column::UpdatedAt, Expr::value(now))
                .filter(quote_request::Column::Id.eq(id))
                .filter(quote_request::Column::AccountId.eq(ctx.account_id))
                .filter(quote_request::Column::Status.eq(from))
                .exec(db)
                .await?
        }
        DocumentKind::PurchaseOrder => {
            purchase_order::Entity::update_many()
                .col_expr(purchase_order::Column::Status, Expr::value(to.to_value()))
                .col_expr(purchase_order::Column::UpdatedAt, Expr::value(now))
                .filter(purchase_order::Column::Id.eq(id))
                .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
                .filter(purchase_order::Column::Status.eq(from))
                .exec(db)
                .await?
        }
    };

    if result.rows_affected == 0 {
        // Either gone or moved by someone else since it was read
        current_status(db, ctx, kind, id).await?;
        return Err(ServiceError::Conflict(format!(
            "{} {} is no longer {}",
            kind, id, from
        )));
    }
    Ok(())
}
