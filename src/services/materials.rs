use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        material, price_history, purchase_order_item, quote_request_item, supplier,
        supplier_material, technical_sheet,
    },
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
        codes::next_code,
        contains_any,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MaterialInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MaterialInput {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            unit: clean(self.unit),
            category: clean(self.category),
            description: clean(self.description),
        }
    }
}

/// A supplier offering a material
#[derive(Debug, Clone, Serialize)]
pub struct MaterialOffer {
    pub supplier: supplier::Model,
    pub specification: Option<String>,
}

#[derive(Clone)]
pub struct MaterialService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl MaterialService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list(&self, ctx: &AccountContext) -> Result<Vec<material::Model>, ServiceError> {
        Ok(material::Entity::find()
            .filter(material::Column::AccountId.eq(ctx.account_id))
            .order_by_asc(material::Column::Code)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(&self, ctx: &AccountContext, id: Uuid) -> Result<material::Model, ServiceError> {
        find_material(&*self.db_pool, ctx, id).await
    }

    pub async fn find_by_code(
        &self,
        ctx: &AccountContext,
        code: &str,
    ) -> Result<Option<material::Model>, ServiceError> {
        find_material_by_code(&*self.db_pool, ctx, code).await
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn search(
        &self,
        ctx: &AccountContext,
        term: &str,
    ) -> Result<Vec<material::Model>, ServiceError> {
        if term.trim().is_empty() {
            return self.list(ctx).await;
        }
        Ok(material::Entity::find()
            .filter(material::Column::AccountId.eq(ctx.account_id))
            .filter(contains_any(
                &[material::Column::Name, material::Column::Code],
                term,
            ))
            .order_by_asc(material::Column::Code)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn create(
        &self,
        ctx: &AccountContext,
        input: MaterialInput,
    ) -> Result<material::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let db = &*self.db_pool;

        let txn = db.begin().await?;
        let existing: Vec<String> = material::Entity::find()
            .filter(material::Column::AccountId.eq(ctx.account_id))
            .select_only()
            .column(material::Column::Code)
            .into_tuple()
            .all(&txn)
            .await?;

        let now = Utc::now();
        let created = material::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(ctx.account_id),
            code: Set(next_code(material::CODE_PREFIX, &existing)),
            name: Set(input.name),
            unit: Set(input.unit),
            category: Set(input.category),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Create,
                "materials",
                format!("Created material {} ({})", created.name, created.code),
            )
            .record(created.id),
        )
        .await;
        self.event_sender
            .send_or_log(Event::MaterialCreated(created.id))
            .await;

        info!(material_id = %created.id, code = %created.code, "Material created");
        Ok(created)
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn update(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        input: MaterialInput,
    ) -> Result<material::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let db = &*self.db_pool;

        let mut active = find_material(db, ctx, id).await?.into_active_model();
        active.name = Set(input.name);
        active.unit = Set(input.unit);
        active.category = Set(input.category);
        active.description = Set(input.description);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Update,
                "materials",
                format!("Updated material {} ({})", updated.name, updated.code),
            )
            .record(updated.id),
        )
        .await;
        self.event_sender
            .send_or_log(Event::MaterialUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Deletes a material with its supplier links and price history. Document
    /// lines keep their copied name and lose the reference.
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = find_material(db, ctx, id).await?;

        let txn = db.begin().await?;
        supplier_material::Entity::delete_many()
            .filter(supplier_material::Column::AccountId.eq(ctx.account_id))
            .filter(supplier_material::Column::MaterialId.eq(id))
            .exec(&txn)
            .await?;
        price_history::Entity::delete_many()
            .filter(price_history::Column::AccountId.eq(ctx.account_id))
            .filter(price_history::Column::MaterialId.eq(id))
            .exec(&txn)
            .await?;
        purchase_order_item::Entity::update_many()
            .col_expr(
                purchase_order_item::Column::MaterialId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(purchase_order_item::Column::MaterialId.eq(id))
            .exec(&txn)
            .await?;
        quote_request_item::Entity::update_many()
            .col_expr(
                quote_request_item::Column::MaterialId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(quote_request_item::Column::MaterialId.eq(id))
            .exec(&txn)
            .await?;
        technical_sheet::Entity::update_many()
            .col_expr(
                technical_sheet::Column::MaterialId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(technical_sheet::Column::AccountId.eq(ctx.account_id))
            .filter(technical_sheet::Column::MaterialId.eq(id))
            .exec(&txn)
            .await?;
        material::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Delete,
                "materials",
                format!("Deleted material {} ({})", existing.name, existing.code),
            )
            .record(id)
            .details(json!({ "code": existing.code })),
        )
        .await;
        self.event_sender.send_or_log(Event::MaterialDeleted(id)).await;

        Ok(())
    }

    /// Suppliers offering a material
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn suppliers_for(
        &self,
        ctx: &AccountContext,
        material_id: Uuid,
    ) -> Result<Vec<MaterialOffer>, ServiceError> {
        let db = &*self.db_pool;
        find_material(db, ctx, material_id).await?;

        let links = supplier_material::Entity::find()
            .filter(supplier_material::Column::AccountId.eq(ctx.account_id))
            .filter(supplier_material::Column::MaterialId.eq(material_id))
            .find_also_related(supplier::Entity)
            .order_by_asc(supplier::Column::Name)
            .all(db)
            .await?;

        Ok(links
            .into_iter()
            .filter_map(|(link, supplier)| {
                supplier.map(|supplier| MaterialOffer {
                    supplier,
                    specification: link.specification,
                })
            })
            .collect())
    }
}

pub(crate) async fn find_material<C>(
    db: &C,
    ctx: &AccountContext,
    id: Uuid,
) -> Result<material::Model, ServiceError>
where
    C: ConnectionTrait,
{
    material::Entity::find_by_id(id)
        .filter(material::Column::AccountId.eq(ctx.account_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Material", id))
}

pub(crate) async fn find_material_by_code<C>(
    db: &C,
    ctx: &AccountContext,
    code: &str,
) -> Result<Option<material::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(material::Entity::find()
        .filter(material::Column::AccountId.eq(ctx.account_id))
        .filter(material::Column::Code.eq(code.trim()))
        .one(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{event_sender, setup_db};
    use assert_matches::assert_matches;

    fn input(name: &str) -> MaterialInput {
        MaterialInput {
            name: name.into(),
            unit: Some(" kg ".into()),
            category: None,
            description: Some("".into()),
        }
    }

    #[tokio::test]
    async fn creates_with_mt_codes_and_trimmed_fields() {
        let (_dir, db) = setup_db().await;
        let service = MaterialService::new(db, event_sender());
        let ctx = AccountContext::system(Uuid::new_v4());

        let first = service.create(&ctx, input("Cemento")).await.unwrap();
        let second = service.create(&ctx, input("Cabilla 1/2")).await.unwrap();

        assert_eq!(first.code, "MT001");
        assert_eq!(second.code, "MT002");
        assert_eq!(first.unit.as_deref(), Some("kg"));
        assert_eq!(first.description, None);
        assert_eq!(service.search(&ctx, "cabilla").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_a_validation_error() {
        let (_dir, db) = setup_db().await;
        let service = MaterialService::new(db, event_sender());
        let ctx = AccountContext::system(Uuid::new_v4());

        assert_matches!(
            service.create(&ctx, input("  ")).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn delete_is_scoped_to_the_owner() {
        let (_dir, db) = setup_db().await;
        let service = MaterialService::new(db, event_sender());
        let owner = AccountContext::system(Uuid::new_v4());
        let other = AccountContext::system(Uuid::new_v4());
        let created = service.create(&owner, input("Arena")).await.unwrap();

        assert_matches!(
            service.delete(&other, created.id).await,
            Err(ServiceError::NotFound(_))
        );
        service.delete(&owner, created.id).await.unwrap();
        assert!(service.list(&owner).await.unwrap().is_empty());
    }
}
