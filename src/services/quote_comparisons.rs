use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    auth::AccountContext,
    commands::purchaseorders::positive,
    db::DbPool,
    errors::ServiceError,
    models::{
        enums::validate_exchange_rate, quote_comparison, quote_comparison_item, supplier,
        Currency,
    },
    services::{
        audit::{self, AuditAction, AuditEntry},
        clean,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_comparison_currency"))]
pub struct QuoteComparisonInput {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub currency: Option<Currency>,
    /// VES per USD applied to offers that carry no rate of their own
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one offer is required"))]
    pub items: Vec<QuoteComparisonItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuoteComparisonItemInput {
    pub supplier_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Material name is required"))]
    pub material_name: String,
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "Unit price cannot be negative"))]
    pub unit_price: f64,
    /// Defaults to the comparison currency
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub lead_time_days: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn validate_comparison_currency(input: &QuoteComparisonInput) -> Result<(), ValidationError> {
    validate_exchange_rate(Currency::Usd, input.exchange_rate)
}

impl QuoteComparisonInput {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for (index, item) in self.items.iter().enumerate() {
            let line = index + 1;
            item.validate()
                .map_err(|e| ServiceError::ValidationError(format!("Offer {}: {}", line, e)))?;
            positive(item.quantity)
                .map_err(|e| ServiceError::ValidationError(format!("Offer {}: {}", line, e)))?;
            validate_exchange_rate(Currency::Usd, item.exchange_rate)
                .map_err(|e| ServiceError::ValidationError(format!("Offer {}: {}", line, e)))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteComparisonDetails {
    #[serde(flatten)]
    pub comparison: quote_comparison::Model,
    pub items: Vec<quote_comparison_item::Model>,
}

/// Cheapest offer for one material, priced in the comparison currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOffer {
    pub material_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub unit_price: f64,
    pub currency: Currency,
    pub original_price: f64,
    pub original_currency: Currency,
    pub lead_time_days: Option<i32>,
    pub offers_compared: usize,
}

/// Picks the cheapest supplier per material name (case-insensitive). Prices are
/// converted with the offer's rate, else `fallback_rate`; offers that cannot be
/// converted are not compared. Ties go to the shorter lead time.
pub fn best_offers(
    items: &[quote_comparison_item::Model],
    supplier_names: &HashMap<Uuid, String>,
    target: Currency,
    fallback_rate: Option<f64>,
) -> Vec<BestOffer> {
    let mut groups: BTreeMap<String, Vec<(f64, &quote_comparison_item::Model)>> = BTreeMap::new();
    for item in items {
        let rate = item
            .exchange_rate
            .filter(|r| *r > 0.0)
            .or(fallback_rate.filter(|r| *r > 0.0));
        if let Some(price) = item.currency.convert(item.unit_price, target, rate) {
            groups
                .entry(item.material_name.trim().to_lowercase())
                .or_default()
                .push((price, item));
        }
    }

    groups
        .into_values()
        .filter_map(|offers| {
            let compared = offers.len();
            offers
                .into_iter()
                .min_by(|(a, x), (b, y)| {
                    a.total_cmp(b).then_with(|| {
                        x.lead_time_days
                            .unwrap_or(i32::MAX)
                            .cmp(&y.lead_time_days.unwrap_or(i32::MAX))
                    })
                })
                .map(|(price, item)| BestOffer {
                    material_name: item.material_name.clone(),
                    supplier_id: item.supplier_id,
                    supplier_name: supplier_names
                        .get(&item.supplier_id)
                        .cloned()
                        .unwrap_or_else(|| item.supplier_id.to_string()),
                    unit_price: (price * 100.0).round() / 100.0,
                    currency: target,
                    original_price: item.unit_price,
                    original_currency: item.currency,
                    lead_time_days: item.lead_time_days,
                    offers_compared: compared,
                })
        })
        .collect()
}

#[derive(Clone)]
pub struct QuoteComparisonService {
    db_pool: Arc<DbPool>,
    default_currency: Currency,
}

impl QuoteComparisonService {
    pub fn new(db_pool: Arc<DbPool>, default_currency: Currency) -> Self {
        Self {
            db_pool,
            default_currency,
        }
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list(
        &self,
        ctx: &AccountContext,
    ) -> Result<Vec<quote_comparison::Model>, ServiceError> {
        Ok(quote_comparison::Entity::find()
            .filter(quote_comparison::Column::AccountId.eq(ctx.account_id))
            .order_by_desc(quote_comparison::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn get(
        &self,
        ctx: &AccountContext,
        id: Uuid,
    ) -> Result<QuoteComparisonDetails, ServiceError> {
        let db = &*self.db_pool;
        let comparison = quote_comparison::Entity::find_by_id(id)
            .filter(quote_comparison::Column::AccountId.eq(ctx.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quote comparison", id))?;
        let items = quote_comparison_item::Entity::find()
            .filter(quote_comparison_item::Column::QuoteComparisonId.eq(id))
            .all(db)
            .await?;
        Ok(QuoteComparisonDetails { comparison, items })
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn create(
        &self,
        ctx: &AccountContext,
        input: QuoteComparisonInput,
    ) -> Result<QuoteComparisonDetails, ServiceError> {
        input.check()?;
        let db = &*self.db_pool;

        let referenced: HashSet<Uuid> = input.items.iter().map(|i| i.supplier_id).collect();
        let known: HashSet<Uuid> = supplier::Entity::find()
            .filter(supplier::Column::AccountId.eq(ctx.account_id))
            .filter(supplier::Column::Id.is_in(referenced.iter().copied()))
            .select_only()
            .column(supplier::Column::Id)
            .into_tuple::<Uuid>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = referenced.iter().find(|id| !known.contains(id)) {
            return Err(ServiceError::not_found("Supplier", missing));
        }

        let currency = input.currency.unwrap_or(self.default_currency);
        let txn = db.begin().await?;
        let comparison = quote_comparison::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(ctx.account_id),
            title: Set(input.title.trim().to_string()),
            currency: Set(currency),
            exchange_rate: Set(input.exchange_rate),
            notes: Set(clean(input.notes.clone())),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let saved = quote_comparison_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                quote_comparison_id: Set(comparison.id),
                supplier_id: Set(item.supplier_id),
                material_name: Set(item.material_name.trim().to_string()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                currency: Set(item.currency.unwrap_or(currency)),
                exchange_rate: Set(item.exchange_rate),
                lead_time_days: Set(item.lead_time_days),
                notes: Set(clean(item.notes.clone())),
            }
            .insert(&txn)
            .await?;
            items.push(saved);
        }
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Create,
                "quote_comparisons",
                format!("Created quote comparison {}", comparison.title),
            )
            .record(comparison.id)
            .details(json!({ "offers": items.len() })),
        )
        .await;

        info!(quote_comparison_id = %comparison.id, offers = items.len(), "Quote comparison created");
        Ok(QuoteComparisonDetails { comparison, items })
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let details = self.get(ctx, id).await?;

        let txn = db.begin().await?;
        quote_comparison_item::Entity::delete_many()
            .filter(quote_comparison_item::Column::QuoteComparisonId.eq(id))
            .exec(&txn)
            .await?;
        quote_comparison::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Delete,
                "quote_comparisons",
                format!("Deleted quote comparison {}", details.comparison.title),
            )
            .record(id),
        )
        .await;
        Ok(())
    }

    /// Cheapest offer per material in the comparison currency
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn best_offers(
        &self,
        ctx: &AccountContext,
        id: Uuid,
    ) -> Result<Vec<BestOffer>, ServiceError> {
        let details = self.get(ctx, id).await?;
        let supplier_ids: Vec<Uuid> = details
            .items
            .iter()
            .map(|i| i.supplier_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<Uuid, String> = supplier::Entity::find()
            .filter(supplier::Column::AccountId.eq(ctx.account_id))
            .filter(supplier::Column::Id.is_in(supplier_ids))
            .select_only()
            .column(supplier::Column::Id)
            .column(supplier::Column::Name)
            .into_tuple::<(Uuid, String)>()
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .collect();

        Ok(best_offers(
            &details.items,
            &names,
            details.comparison.currency,
            details.comparison.exchange_rate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(
        supplier_id: Uuid,
        material: &str,
        price: f64,
        currency: Currency,
        rate: Option<f64>,
        lead_time: Option<i32>,
    ) -> quote_comparison_item::Model {
        quote_comparison_item::Model {
            id: Uuid::new_v4(),
            quote_comparison_id: Uuid::nil(),
            supplier_id,
            material_name: material.to_string(),
            quantity: 10.0,
            unit_price: price,
            currency,
            exchange_rate: rate,
            lead_time_days: lead_time,
            notes: None,
        }
    }

    #[test]
    fn picks_the_cheapest_supplier_per_material() {
        let acme = Uuid::new_v4();
        let beta = Uuid::new_v4();
        let names = HashMap::from([(acme, "Acme".to_string()), (beta, "Beta".to_string())]);
        let items = vec![
            offer(acme, "Cemento", 12.0, Currency::Usd, None, Some(3)),
            offer(beta, "cemento ", 400.0, Currency::Ves, Some(40.0), Some(5)),
            offer(acme, "Arena", 3.0, Currency::Usd, None, None),
        ];

        let best = best_offers(&items, &names, Currency::Usd, None);
        assert_eq!(best.len(), 2);

        let cement = best.iter().find(|b| b.material_name.trim() == "cemento").unwrap();
        assert_eq!(cement.supplier_name, "Beta");
        assert_eq!(cement.unit_price, 10.0);
        assert_eq!(cement.original_currency, Currency::Ves);
        assert_eq!(cement.offers_compared, 2);
    }

    #[test]
    fn ties_go_to_the_faster_delivery_and_unconvertible_offers_are_skipped() {
        let acme = Uuid::new_v4();
        let beta = Uuid::new_v4();
        let gamma = Uuid::new_v4();
        let items = vec![
            offer(acme, "Cabilla", 8.0, Currency::Usd, None, Some(10)),
            offer(beta, "Cabilla", 8.0, Currency::Usd, None, Some(2)),
            offer(gamma, "Cabilla", 1.0, Currency::Ves, None, Some(1)),
        ];

        let best = best_offers(&items, &HashMap::new(), Currency::Usd, None);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].supplier_id, beta);
        assert_eq!(best[0].offers_compared, 2);
    }

    #[test]
    fn comparison_rate_is_the_fallback() {
        let acme = Uuid::new_v4();
        let items = vec![offer(acme, "Bloque", 2.0, Currency::Usd, None, None)];

        let best = best_offers(&items, &HashMap::new(), Currency::Ves, Some(36.5));
        assert_eq!(best[0].unit_price, 73.0);
        assert_eq!(best[0].currency, Currency::Ves);
    }
}
