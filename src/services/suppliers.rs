use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    commands::{
        suppliers::{
            CreateSupplierCommand, DeleteSupplierCommand, SupplierInput, UpdateSupplierCommand,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{material, supplier, supplier_material, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean, contains_any,
        lifecycle::{ArchiveCounts, LifecycleManager},
    },
};

/// Result of a supplier update, including the documents archived when the
/// update deactivated the supplier.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierUpdateOutcome {
    pub supplier: supplier::Model,
    pub archived: ArchiveCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A material offered by a supplier, with the supplier-specific specification
#[derive(Debug, Clone, Serialize)]
pub struct SuppliedMaterial {
    pub material: material::Model,
    pub specification: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierMaterialInput {
    pub material_id: Uuid,
    #[serde(default)]
    pub specification: Option<String>,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    lifecycle: Arc<LifecycleManager>,
}

impl SupplierService {
    /// Creates a new supplier service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        lifecycle: Arc<LifecycleManager>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            lifecycle,
        }
    }

    /// Lists the account's suppliers ordered by code
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list(
        &self,
        ctx: &AccountContext,
        status: Option<SupplierStatus>,
    ) -> Result<Vec<supplier::Model>, ServiceError> {
        let mut query = supplier::Entity::find()
            .filter(supplier::Column::AccountId.eq(ctx.account_id))
            .order_by_asc(supplier::Column::Code);
        if let Some(status) = status {
            query = query.filter(supplier::Column::Status.eq(status));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    /// Gets a supplier by ID
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn get(&self, ctx: &AccountContext, id: Uuid) -> Result<supplier::Model, ServiceError> {
        find_supplier(&*self.db_pool, ctx, id).await
    }

    pub async fn find_by_code(
        &self,
        ctx: &AccountContext,
        code: &str,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        find_supplier_by_code(&*self.db_pool, ctx, code).await
    }

    /// Substring search over name, code and RIF
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn search(
        &self,
        ctx: &AccountContext,
        term: &str,
    ) -> Result<Vec<supplier::Model>, ServiceError> {
        if term.trim().is_empty() {
            return self.list(ctx, None).await;
        }
        let matches = supplier::Entity::find()
            .filter(supplier::Column::AccountId.eq(ctx.account_id))
            .filter(contains_any(
                &[
                    supplier::Column::Name,
                    supplier::Column::Code,
                    supplier::Column::Rif,
                ],
                term,
            ))
            .order_by_asc(supplier::Column::Code)
            .all(&*self.db_pool)
            .await?;
        Ok(matches)
    }

    /// Creates a new supplier with the next free code
    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn create(
        &self,
        ctx: &AccountContext,
        input: SupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        CreateSupplierCommand {
            account: ctx.clone(),
            input,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Replaces a supplier's fields. Deactivating archives its open documents.
    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn update(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        input: SupplierInput,
    ) -> Result<SupplierUpdateOutcome, ServiceError> {
        let result = UpdateSupplierCommand {
            account: ctx.clone(),
            id,
            input,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await?;

        let (archived, warning) = if result.deactivated() {
            self.lifecycle.archive_after_deactivation(ctx, id).await
        } else {
            (ArchiveCounts::default(), None)
        };

        Ok(SupplierUpdateOutcome {
            supplier: result.supplier,
            archived,
            warning,
        })
    }

    /// Changes only the status
    pub async fn set_status(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        status: SupplierStatus,
    ) -> Result<SupplierUpdateOutcome, ServiceError> {
        let current = self.get(ctx, id).await?;
        let mut input = input_from_model(&current);
        input.status = Some(status);
        self.update(ctx, id, input).await
    }

    /// Deletes a supplier that has no quote requests or purchase orders
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        DeleteSupplierCommand {
            account: ctx.clone(),
            id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Materials offered by a supplier, ordered by material code
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list_materials(
        &self,
        ctx: &AccountContext,
        supplier_id: Uuid,
    ) -> Result<Vec<SuppliedMaterial>, ServiceError> {
        let db = &*self.db_pool;
        find_supplier(db, ctx, supplier_id).await?;

        let links = supplier_material::Entity::find()
            .filter(supplier_material::Column::AccountId.eq(ctx.account_id))
            .filter(supplier_material::Column::SupplierId.eq(supplier_id))
            .find_also_related(material::Entity)
            .order_by_asc(material::Column::Code)
            .all(db)
            .await?;

        Ok(links
            .into_iter()
            .filter_map(|(link, material)| {
                material.map(|material| SuppliedMaterial {
                    material,
                    specification: link.specification,
                })
            })
            .collect())
    }

    /// Links a material to a supplier, replacing the specification of an existing link
    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn upsert_material(
        &self,
        ctx: &AccountContext,
        supplier_id: Uuid,
        input: SupplierMaterialInput,
    ) -> Result<supplier_material::Model, ServiceError> {
        let db = &*self.db_pool;
        let supplier = find_supplier(db, ctx, supplier_id).await?;
        let material = crate::services::materials::find_material(db, ctx, input.material_id).await?;

        let (link, created) =
            link_material(db, ctx, supplier.id, material.id, input.specification).await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                if created {
                    AuditAction::Create
                } else {
                    AuditAction::Update
                },
                "supplier_materials",
                format!("Linked material {} to supplier {}", material.code, supplier.code),
            )
            .record(link.id),
        )
        .await;

        Ok(link)
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn remove_material(
        &self,
        ctx: &AccountContext,
        supplier_id: Uuid,
        material_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = supplier_material::Entity::delete_many()
            .filter(supplier_material::Column::AccountId.eq(ctx.account_id))
            .filter(supplier_material::Column::SupplierId.eq(supplier_id))
            .filter(supplier_material::Column::MaterialId.eq(material_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Material {} is not linked to supplier {}",
                material_id, supplier_id
            )));
        }

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Delete,
                "supplier_materials",
                "Unlinked material from supplier",
            )
            .details(json!({ "supplier_id": supplier_id, "material_id": material_id })),
        )
        .await;

        info!(%supplier_id, %material_id, "Material unlinked from supplier");
        Ok(())
    }
}

fn input_from_model(model: &supplier::Model) -> SupplierInput {
    SupplierInput {
        rif: model.rif.clone(),
        name: model.name.clone(),
        contact_name: model.contact_name.clone(),
        email: model.email.clone(),
        phone: model.phone.clone(),
        address: model.address.clone(),
        payment_terms: model.payment_terms,
        credit_days: model.credit_days,
        custom_payment_terms: model.custom_payment_terms.clone(),
        status: Some(model.status),
    }
}

pub(crate) async fn find_supplier<C>(
    db: &C,
    ctx: &AccountContext,
    id: Uuid,
) -> Result<supplier::Model, ServiceError>
where
    C: ConnectionTrait,
{
    supplier::Entity::find_by_id(id)
        .filter(supplier::Column::AccountId.eq(ctx.account_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Supplier", id))
}

pub(crate) async fn find_supplier_by_code<C>(
    db: &C,
    ctx: &AccountContext,
    code: &str,
) -> Result<Option<supplier::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(supplier::Entity::find()
        .filter(supplier::Column::AccountId.eq(ctx.account_id))
        .filter(supplier::Column::Code.eq(code.trim()))
        .one(db)
        .await?)
}

/// Inserts or updates the (supplier, material) link. Returns whether a new link was created.
pub(crate) async fn link_material<C>(
    db: &C,
    ctx: &AccountContext,
    supplier_id: Uuid,
    material_id: Uuid,
    specification: Option<String>,
) -> Result<(supplier_material::Model, bool), ServiceError>
where
    C: ConnectionTrait,
{
    let specification = clean(specification);

    let existing = supplier_material::Entity::find()
        .filter(supplier_material::Column::AccountId.eq(ctx.account_id))
        .filter(supplier_material::Column::SupplierId.eq(supplier_id))
        .filter(supplier_material::Column::MaterialId.eq(material_id))
        .one(db)
        .await?;

    match existing {
        Some(link) => {
            let mut active = link.into_active_model();
            active.specification = Set(specification);
            Ok((active.update(db).await?, false))
        }
        None => {
            let link = supplier_material::ActiveModel {
                id: Set(Uuid::new_v4()),
                account_id: Set(ctx.account_id),
                supplier_id: Set(supplier_id),
                material_id: Set(material_id),
                specification: Set(specification),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await?;
            Ok((link, true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentTermsKind, SupplierStatus};
    use crate::services::test_support::{event_sender, setup_db};
    use assert_matches::assert_matches;

    fn service(db: Arc<DbPool>) -> SupplierService {
        let events = event_sender();
        let lifecycle = Arc::new(LifecycleManager::new(db.clone(), events.clone(), true));
        SupplierService::new(db, events, lifecycle)
    }

    fn input(name: &str) -> SupplierInput {
        serde_json::from_value(json!({ "rif": "J-30000000-1", "name": name })).unwrap()
    }

    #[tokio::test]
    async fn codes_are_sequential_per_account() {
        let (_dir, db) = setup_db().await;
        let service = service(db);
        let ctx = AccountContext::system(Uuid::new_v4());
        let other = AccountContext::system(Uuid::new_v4());

        assert_eq!(service.create(&ctx, input("Uno")).await.unwrap().code, "P001");
        assert_eq!(service.create(&ctx, input("Dos")).await.unwrap().code, "P002");
        assert_eq!(service.create(&other, input("Otro")).await.unwrap().code, "P001");
    }

    #[tokio::test]
    async fn other_accounts_cannot_see_or_change_a_supplier() {
        let (_dir, db) = setup_db().await;
        let service = service(db);
        let owner = AccountContext::system(Uuid::new_v4());
        let intruder = AccountContext::system(Uuid::new_v4());

        let created = service.create(&owner, input("Acme")).await.unwrap();

        assert_matches!(
            service.get(&intruder, created.id).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            service.update(&intruder, created.id, input("Hijacked")).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(service.list(&intruder, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_rejects_broken_payment_terms() {
        let (_dir, db) = setup_db().await;
        let service = service(db);
        let ctx = AccountContext::system(Uuid::new_v4());
        let created = service.create(&ctx, input("Acme")).await.unwrap();

        let mut change = input("Acme");
        change.payment_terms = PaymentTermsKind::Other;
        assert_matches!(
            service.update(&ctx, created.id, change.clone()).await,
            Err(ServiceError::ValidationError(_))
        );

        change.custom_payment_terms = Some("50% adelantado, 50% contra entrega".into());
        let outcome = service.update(&ctx, created.id, change).await.unwrap();
        assert_eq!(outcome.supplier.payment_terms, PaymentTermsKind::Other);
        assert_eq!(outcome.archived, ArchiveCounts::default());
    }

    #[tokio::test]
    async fn search_matches_name_code_and_rif() {
        let (_dir, db) = setup_db().await;
        let service = service(db);
        let ctx = AccountContext::system(Uuid::new_v4());
        service.create(&ctx, input("Ferretería Central")).await.unwrap();
        service.create(&ctx, input("Plásticos Unidos")).await.unwrap();

        assert_eq!(service.search(&ctx, "central").await.unwrap().len(), 1);
        assert_eq!(service.search(&ctx, "P002").await.unwrap().len(), 1);
        assert_eq!(service.search(&ctx, "j-3000").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn material_links_upsert_on_the_pair() {
        let (_dir, db) = setup_db().await;
        let service = service(db.clone());
        let materials = crate::services::materials::MaterialService::new(db, event_sender());
        let ctx = AccountContext::system(Uuid::new_v4());

        let supplier = service.create(&ctx, input("Acme")).await.unwrap();
        let cement = materials
            .create(&ctx, serde_json::from_value(json!({ "name": "Cemento" })).unwrap())
            .await
            .unwrap();

        let first = service
            .upsert_material(
                &ctx,
                supplier.id,
                SupplierMaterialInput {
                    material_id: cement.id,
                    specification: Some("Saco 42.5kg".into()),
                },
            )
            .await
            .unwrap();
        let second = service
            .upsert_material(
                &ctx,
                supplier.id,
                SupplierMaterialInput {
                    material_id: cement.id,
                    specification: Some("Tipo I".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let listed = service.list_materials(&ctx, supplier.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].specification.as_deref(), Some("Tipo I"));

        service.remove_material(&ctx, supplier.id, cement.id).await.unwrap();
        assert_matches!(
            service.remove_material(&ctx, supplier.id, cement.id).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn set_status_keeps_other_fields() {
        let (_dir, db) = setup_db().await;
        let service = service(db);
        let ctx = AccountContext::system(Uuid::new_v4());
        let created = service.create(&ctx, input("Acme")).await.unwrap();

        let outcome = service
            .set_status(&ctx, created.id, SupplierStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(outcome.supplier.status, SupplierStatus::Inactive);
        assert_eq!(outcome.supplier.name, "Acme");
        assert_eq!(outcome.supplier.code, created.code);
    }
}
