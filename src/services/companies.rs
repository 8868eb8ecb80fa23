use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{company, purchase_order, quote_request},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean, contains_any,
    },
};

/// Buying company printed on quote requests and purchase orders
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyInput {
    #[validate(length(min = 1, max = 20, message = "RIF is required"))]
    pub rif: String,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub logo_url: Option<String>,
}

impl CompanyInput {
    fn normalized(self) -> Self {
        Self {
            rif: self.rif.trim().to_uppercase(),
            name: self.name.trim().to_string(),
            address: clean(self.address),
            phone: clean(self.phone),
            email: clean(self.email),
            logo_url: clean(self.logo_url),
        }
    }
}

#[derive(Clone)]
pub struct CompanyService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CompanyService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn list(&self, ctx: &AccountContext) -> Result<Vec<company::Model>, ServiceError> {
        Ok(company::Entity::find()
            .filter(company::Column::AccountId.eq(ctx.account_id))
            .order_by_asc(company::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(&self, ctx: &AccountContext, id: Uuid) -> Result<company::Model, ServiceError> {
        find_company(&*self.db_pool, ctx, id).await
    }

    pub async fn search(
        &self,
        ctx: &AccountContext,
        term: &str,
    ) -> Result<Vec<company::Model>, ServiceError> {
        if term.trim().is_empty() {
            return self.list(ctx).await;
        }
        Ok(company::Entity::find()
            .filter(company::Column::AccountId.eq(ctx.account_id))
            .filter(contains_any(&[company::Column::Name, company::Column::Rif], term))
            .order_by_asc(company::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn create(
        &self,
        ctx: &AccountContext,
        input: CompanyInput,
    ) -> Result<company::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let db = &*self.db_pool;

        let now = Utc::now();
        let created = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(ctx.account_id),
            rif: Set(input.rif),
            name: Set(input.name),
            address: Set(input.address),
            phone: Set(input.phone),
            email: Set(input.email),
            logo_url: Set(input.logo_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Create,
                "companies",
                format!("Created company {}", created.name),
            )
            .record(created.id),
        )
        .await;
        self.event_sender
            .send_or_log(Event::CompanyCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn update(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        input: CompanyInput,
    ) -> Result<company::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let db = &*self.db_pool;

        let mut active = find_company(db, ctx, id).await?.into_active_model();
        active.rif = Set(input.rif);
        active.name = Set(input.name);
        active.address = Set(input.address);
        active.phone = Set(input.phone);
        active.email = Set(input.email);
        active.logo_url = Set(input.logo_url);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Update,
                "companies",
                format!("Updated company {}", updated.name),
            )
            .record(updated.id),
        )
        .await;
        self.event_sender
            .send_or_log(Event::CompanyUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes a company no document refers to
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = find_company(db, ctx, id).await?;

        let in_use = quote_request::Entity::find()
            .filter(quote_request::Column::AccountId.eq(ctx.account_id))
            .filter(quote_request::Column::CompanyId.eq(id))
            .count(db)
            .await?
            + purchase_order::Entity::find()
                .filter(purchase_order::Column::AccountId.eq(ctx.account_id))
                .filter(purchase_order::Column::CompanyId.eq(id))
                .count(db)
                .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Company {} is used by {} document(s)",
                existing.name, in_use
            )));
        }

        company::Entity::delete_by_id(id).exec(db).await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Delete,
                "companies",
                format!("Deleted company {}", existing.name),
            )
            .record(id),
        )
        .await;
        self.event_sender.send_or_log(Event::CompanyDeleted(id)).await;
        Ok(())
    }
}

pub(crate) async fn find_company<C>(
    db: &C,
    ctx: &AccountContext,
    id: Uuid,
) -> Result<company::Model, ServiceError>
where
    C: ConnectionTrait,
{
    company::Entity::find_by_id(id)
        .filter(company::Column::AccountId.eq(ctx.account_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Company", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{event_sender, setup_db};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn create_update_and_search() {
        let (_dir, db) = setup_db().await;
        let service = CompanyService::new(db, event_sender());
        let ctx = AccountContext::system(Uuid::new_v4());

        let created = service
            .create(
                &ctx,
                CompanyInput {
                    rif: "j-40000000-0".into(),
                    name: "Constructora Andina".into(),
                    address: None,
                    phone: None,
                    email: Some("compras@andina.com.ve".into()),
                    logo_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.rif, "J-40000000-0");

        let mut change = CompanyInput {
            rif: created.rif.clone(),
            name: "Constructora Andina C.A.".into(),
            address: Some("Mérida".into()),
            phone: None,
            email: None,
            logo_url: None,
        };
        let updated = service.update(&ctx, created.id, change.clone()).await.unwrap();
        assert_eq!(updated.address.as_deref(), Some("Mérida"));
        assert_eq!(service.search(&ctx, "andina").await.unwrap().len(), 1);

        change.email = Some("not-an-email".into());
        assert_matches!(
            service.update(&ctx, created.id, change).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let (_dir, db) = setup_db().await;
        let service = CompanyService::new(db, event_sender());
        let ctx = AccountContext::system(Uuid::new_v4());

        let companies = [
            ("J-40000010-0", "Obras 100% Llave"),
            ("J-40000011-0", "Obras 1000 Llave"),
        ];
        for (rif, name) in companies {
            service
                .create(
                    &ctx,
                    CompanyInput {
                        rif: rif.into(),
                        name: name.into(),
                        address: None,
                        phone: None,
                        email: None,
                        logo_url: None,
                    },
                )
                .await
                .unwrap();
        }

        let found = service.search(&ctx, "100%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Obras 100% Llave");
        assert!(service.search(&ctx, "obras_1").await.unwrap().is_empty());
    }
}
