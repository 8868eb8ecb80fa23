use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    models::{
        material, price_history, profile, purchase_order, purchase_order_item, supplier,
        Currency,
    },
    services::materials::find_material,
};

/// Price statistics of one supplier for one material, in the requested currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPriceSummary {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub currency: Currency,
    pub count: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub average_price: f64,
    pub latest_price: f64,
    pub latest_date: DateTime<Utc>,
}

/// Inserts one entry per line that references a material of the account and has a price.
/// Returns the number of entries written.
pub async fn record_for_order<C>(
    db: &C,
    ctx: &AccountContext,
    order: &purchase_order::Model,
    items: &[purchase_order_item::Model],
) -> Result<usize, ServiceError>
where
    C: ConnectionTrait,
{
    let referenced: Vec<Uuid> = items
        .iter()
        .filter(|item| item.unit_price > Decimal::ZERO)
        .filter_map(|item| item.material_id)
        .collect();
    if referenced.is_empty() {
        return Ok(0);
    }

    let known: HashSet<Uuid> = material::Entity::find()
        .filter(material::Column::AccountId.eq(ctx.account_id))
        .filter(material::Column::Id.is_in(referenced))
        .select_only()
        .column(material::Column::Id)
        .into_tuple::<Uuid>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let recorded_at = Utc::now();
    let entries: Vec<price_history::ActiveModel> = items
        .iter()
        .filter(|item| item.unit_price > Decimal::ZERO)
        .filter_map(|item| {
            let material_id = item.material_id.filter(|id| known.contains(id))?;
            Some((material_id, item.unit_price.to_f64()?))
        })
        .map(|(material_id, unit_price)| price_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(ctx.account_id),
            material_id: Set(material_id),
            supplier_id: Set(order.supplier_id),
            unit_price: Set(unit_price),
            currency: Set(order.currency),
            exchange_rate: Set(order.exchange_rate),
            purchase_order_id: Set(order.id),
            recorded_at: Set(recorded_at),
        })
        .collect();

    let written = entries.len();
    if written > 0 {
        price_history::Entity::insert_many(entries).exec(db).await?;
    }
    Ok(written)
}

pub async fn delete_for_order<C>(
    db: &C,
    ctx: &AccountContext,
    purchase_order_id: Uuid,
) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let result = price_history::Entity::delete_many()
        .filter(price_history::Column::AccountId.eq(ctx.account_id))
        .filter(price_history::Column::PurchaseOrderId.eq(purchase_order_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Full replace: the order's entries afterwards mirror its current lines.
pub async fn replace_for_order<C>(
    db: &C,
    ctx: &AccountContext,
    order: &purchase_order::Model,
    items: &[purchase_order_item::Model],
) -> Result<usize, ServiceError>
where
    C: ConnectionTrait,
{
    delete_for_order(db, ctx, order.id).await?;
    record_for_order(db, ctx, order, items).await
}

/// Price history never blocks an order: failures are logged and reported as zero entries.
pub async fn replace_best_effort<C>(
    db: &C,
    ctx: &AccountContext,
    order: &purchase_order::Model,
    items: &[purchase_order_item::Model],
) -> usize
where
    C: ConnectionTrait,
{
    match replace_for_order(db, ctx, order, items).await {
        Ok(written) => {
            debug!(purchase_order_id = %order.id, written, "Price history recorded");
            written
        }
        Err(e) => {
            warn!(purchase_order_id = %order.id, error = %e, "Failed to record price history");
            metrics::counter!("procurement_price_history.failures", 1);
            0
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Groups entries by supplier and converts each price into `target`, using the
/// entry's own rate first and `fallback_rate` otherwise. Entries that need a
/// conversion without any usable rate are left out.
pub fn summarize(
    entries: &[price_history::Model],
    supplier_names: &HashMap<Uuid, String>,
    target: Currency,
    fallback_rate: Option<f64>,
) -> Vec<SupplierPriceSummary> {
    struct Acc {
        prices: Vec<f64>,
        latest: (DateTime<Utc>, f64),
    }

    let mut groups: BTreeMap<Uuid, Acc> = BTreeMap::new();
    for entry in entries {
        let rate = entry
            .exchange_rate
            .filter(|r| *r > 0.0)
            .or(fallback_rate.filter(|r| *r > 0.0));
        let Some(price) = entry.currency.convert(entry.unit_price, target, rate) else {
            continue;
        };

        groups
            .entry(entry.supplier_id)
            .and_modify(|acc| {
                acc.prices.push(price);
                if entry.recorded_at > acc.latest.0 {
                    acc.latest = (entry.recorded_at, price);
                }
            })
            .or_insert_with(|| Acc {
                prices: vec![price],
                latest: (entry.recorded_at, price),
            });
    }

    let mut summaries: Vec<SupplierPriceSummary> = groups
        .into_iter()
        .map(|(supplier_id, acc)| {
            let count = acc.prices.len();
            let min = acc.prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = acc.prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let average = acc.prices.iter().sum::<f64>() / count as f64;
            SupplierPriceSummary {
                supplier_id,
                supplier_name: supplier_names
                    .get(&supplier_id)
                    .cloned()
                    .unwrap_or_else(|| supplier_id.to_string()),
                currency: target,
                count,
                min_price: round2(min),
                max_price: round2(max),
                average_price: round2(average),
                latest_price: round2(acc.latest.1),
                latest_date: acc.latest.0,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        a.average_price
            .total_cmp(&b.average_price)
            .then_with(|| a.supplier_name.cmp(&b.supplier_name))
    });
    summaries
}

#[derive(Clone)]
pub struct PriceHistoryService {
    db_pool: Arc<DbPool>,
}

impl PriceHistoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Entries for a material, newest first
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list_for_material(
        &self,
        ctx: &AccountContext,
        material_id: Uuid,
        supplier_id: Option<Uuid>,
    ) -> Result<Vec<price_history::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_material(db, ctx, material_id).await?;

        let mut query = price_history::Entity::find()
            .filter(price_history::Column::AccountId.eq(ctx.account_id))
            .filter(price_history::Column::MaterialId.eq(material_id))
            .order_by_desc(price_history::Column::RecordedAt);
        if let Some(supplier_id) = supplier_id {
            query = query.filter(price_history::Column::SupplierId.eq(supplier_id));
        }
        Ok(query.all(db).await?)
    }

    /// Per-supplier price statistics for a material. Without an explicit
    /// fallback rate the profile's default exchange rate is used.
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn summarize_material(
        &self,
        ctx: &AccountContext,
        material_id: Uuid,
        target: Currency,
        fallback_rate: Option<f64>,
    ) -> Result<Vec<SupplierPriceSummary>, ServiceError> {
        let db = &*self.db_pool;
        let entries = self.list_for_material(ctx, material_id, None).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let fallback_rate = match fallback_rate.filter(|r| *r > 0.0) {
            Some(rate) => Some(rate),
            None => profile::Entity::find_by_id(ctx.account_id)
                .one(db)
                .await?
                .and_then(|p| p.default_exchange_rate),
        };

        let supplier_ids: Vec<Uuid> = entries
            .iter()
            .map(|e| e.supplier_id)
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
            .all(db)
            .await?
            .into_iter()
            .collect();

        Ok(summarize(&entries, &names, target, fallback_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(
        supplier_id: Uuid,
        price: f64,
        currency: Currency,
        rate: Option<f64>,
        days_ago: i64,
    ) -> price_history::Model {
        price_history::Model {
            id: Uuid::new_v4(),
            account_id: Uuid::nil(),
            material_id: Uuid::nil(),
            supplier_id,
            unit_price: price,
            currency,
            exchange_rate: rate,
            purchase_order_id: Uuid::new_v4(),
            recorded_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn groups_by_supplier_and_converts() {
        let acme = Uuid::new_v4();
        let beta = Uuid::new_v4();
        let names = HashMap::from([(acme, "Acme".to_string()), (beta, "Beta".to_string())]);

        let entries = vec![
            entry(acme, 10.0, Currency::Usd, None, 3),
            entry(acme, 400.0, Currency::Ves, Some(40.0), 1),
            entry(beta, 12.5, Currency::Usd, None, 2),
        ];

        let summary = summarize(&entries, &names, Currency::Usd, None);
        assert_eq!(summary.len(), 2);

        let acme_row = summary.iter().find(|s| s.supplier_id == acme).unwrap();
        assert_eq!(acme_row.count, 2);
        assert_eq!(acme_row.min_price, 10.0);
        assert_eq!(acme_row.max_price, 10.0);
        assert_eq!(acme_row.latest_price, 10.0);
        assert_eq!(acme_row.supplier_name, "Acme");

        // cheapest average first
        assert_eq!(summary[0].supplier_id, acme);
    }

    #[test]
    fn skips_entries_without_any_usable_rate() {
        let acme = Uuid::new_v4();
        let entries = vec![
            entry(acme, 365.0, Currency::Ves, None, 1),
            entry(acme, 5.0, Currency::Usd, None, 2),
        ];

        let without_fallback = summarize(&entries, &HashMap::new(), Currency::Usd, None);
        assert_eq!(without_fallback[0].count, 1);
        assert_eq!(without_fallback[0].average_price, 5.0);

        let with_fallback = summarize(&entries, &HashMap::new(), Currency::Usd, Some(36.5));
        assert_eq!(with_fallback[0].count, 2);
        assert_eq!(with_fallback[0].max_price, 10.0);
        assert_eq!(with_fallback[0].latest_price, 10.0);
    }

    #[test]
    fn entry_rate_wins_over_fallback_and_values_are_rounded() {
        let acme = Uuid::new_v4();
        let entries = vec![entry(acme, 1.0, Currency::Usd, Some(36.123), 0)];

        let summary = summarize(&entries, &HashMap::new(), Currency::Ves, Some(50.0));
        assert_eq!(summary[0].average_price, 36.12);
        assert_eq!(summary[0].currency, Currency::Ves);
    }
}
