use chrono::Utc;
use sea_orm::{sea_query::OnConflict, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    models::{enums::validate_exchange_rate, profile, Currency},
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
    },
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileInput {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub display_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// VES per USD
    #[serde(default)]
    pub default_exchange_rate: Option<f64>,
}

#[derive(Clone)]
pub struct ProfileService {
    db_pool: Arc<DbPool>,
}

impl ProfileService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// The account's profile, or an empty one when none was saved yet
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn get(&self, ctx: &AccountContext) -> Result<profile::Model, ServiceError> {
        let found = profile::Entity::find_by_id(ctx.account_id)
            .one(&*self.db_pool)
            .await?;
        Ok(found.unwrap_or_else(|| profile::Model {
            account_id: ctx.account_id,
            display_name: None,
            email: None,
            default_exchange_rate: None,
            updated_at: Utc::now(),
        }))
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn upsert(
        &self,
        ctx: &AccountContext,
        input: ProfileInput,
    ) -> Result<profile::Model, ServiceError> {
        input.validate()?;
        validate_exchange_rate(Currency::Usd, input.default_exchange_rate)?;
        let db = &*self.db_pool;

        let model = profile::ActiveModel {
            account_id: Set(ctx.account_id),
            display_name: Set(clean(input.display_name)),
            email: Set(clean(input.email)),
            default_exchange_rate: Set(input.default_exchange_rate),
            updated_at: Set(Utc::now()),
        };
        profile::Entity::insert(model)
            .on_conflict(
                OnConflict::column(profile::Column::AccountId)
                    .update_columns([
                        profile::Column::DisplayName,
                        profile::Column::Email,
                        profile::Column::DefaultExchangeRate,
                        profile::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(AuditAction::Update, "profiles", "Updated profile"),
        )
        .await;

        self.get(ctx).await
    }
}
