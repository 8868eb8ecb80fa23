pub mod create_purchase_order_command;
pub mod update_purchase_order_command;

pub use create_purchase_order_command::CreatePurchaseOrderCommand;
pub use update_purchase_order_command::UpdatePurchaseOrderCommand;

use chrono::{NaiveDate, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    auth::AccountContext,
    errors::ServiceError,
    models::{
        enums::validate_exchange_rate, purchase_order, purchase_order_item,
        purchase_order_sequence, Currency,
    },
    services::clean,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_order_currency"))]
pub struct PurchaseOrderInput {
    pub supplier_id: Uuid,
    pub company_id: Uuid,
    #[serde(default)]
    pub quote_request_id: Option<Uuid>,
    /// Falls back to the configured default currency
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub observations: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<PurchaseOrderItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseOrderItemInput {
    #[serde(default)]
    pub material_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Material name is required"))]
    pub material_name: String,
    #[validate(range(max = 1000000000.0, message = "Quantity is too large"))]
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[validate(range(
        min = 0.0,
        max = 1000000000.0,
        message = "Unit price must be between 0 and 1000000000"
    ))]
    pub unit_price: f64,
    /// Fraction, e.g. 0.16
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0, message = "Tax rate must be between 0 and 1"))]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_exempt: bool,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percent: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub markup_percent: Option<f64>,
}

pub(crate) fn positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("quantity");
        err.message = Some("Quantity must be greater than zero".into());
        Err(err)
    }
}

fn validate_order_currency(input: &PurchaseOrderInput) -> Result<(), ValidationError> {
    validate_exchange_rate(input.currency.unwrap_or(Currency::Usd), input.exchange_rate)
}

impl PurchaseOrderInput {
    /// Validates the header and every line; line errors name the line number.
    pub fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for (index, item) in self.items.iter().enumerate() {
            item.validate().map_err(|e| {
                ServiceError::ValidationError(format!("Item {}: {}", index + 1, e))
            })?;
            positive(item.quantity).map_err(|e| {
                ServiceError::ValidationError(format!("Item {}: {}", index + 1, e))
            })?;
        }
        Ok(())
    }

    pub fn currency(&self) -> Currency {
        self.currency.unwrap_or(Currency::Usd)
    }

    /// USD documents do not keep a rate unless one was given explicitly
    pub fn exchange_rate(&self) -> Option<f64> {
        self.exchange_rate.filter(|r| *r > 0.0)
    }
}

/// Amounts of one line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAmounts {
    pub net: Decimal,
    pub tax: Decimal,
}

/// Header totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

fn decimal(value: f64, field: &str) -> Result<Decimal, ServiceError> {
    Decimal::from_f64(value).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "{} {} cannot be represented as an amount",
            field, value
        ))
    })
}

fn out_of_range() -> ServiceError {
    ServiceError::ValidationError("Line amount is out of range".into())
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `net = base - discount + markup`, markup applied after the discount;
/// tax is charged on the net amount unless the line is exempt.
pub fn line_amounts(item: &PurchaseOrderItemInput) -> Result<LineAmounts, ServiceError> {
    let hundred = Decimal::ONE_HUNDRED;
    let base = decimal(item.quantity, "quantity")?
        .checked_mul(decimal(item.unit_price, "unit_price")?)
        .ok_or_else(out_of_range)?;
    let discount = base
        .checked_mul(decimal(item.discount_percent.unwrap_or(0.0), "discount_percent")?)
        .and_then(|d| d.checked_div(hundred))
        .ok_or_else(out_of_range)?;
    let discounted = base.checked_sub(discount).ok_or_else(out_of_range)?;
    let markup = discounted
        .checked_mul(decimal(item.markup_percent.unwrap_or(0.0), "markup_percent")?)
        .and_then(|m| m.checked_div(hundred))
        .ok_or_else(out_of_range)?;
    let net = discounted.checked_add(markup).ok_or_else(out_of_range)?;
    let tax = if item.tax_exempt {
        Decimal::ZERO
    } else {
        net.checked_mul(decimal(item.tax_rate, "tax_rate")?)
            .ok_or_else(out_of_range)?
    };
    Ok(LineAmounts { net, tax })
}

fn line_error(index: usize, err: ServiceError) -> ServiceError {
    match err {
        ServiceError::ValidationError(msg) => {
            ServiceError::ValidationError(format!("Item {}: {}", index + 1, msg))
        }
        other => other,
    }
}

pub fn order_totals(items: &[PurchaseOrderItemInput]) -> Result<OrderTotals, ServiceError> {
    let mut subtotal = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    for (index, item) in items.iter().enumerate() {
        let line = line_amounts(item).map_err(|e| line_error(index, e))?;
        subtotal = subtotal
            .checked_add(line.net)
            .ok_or_else(|| line_error(index, out_of_range()))?;
        tax = tax
            .checked_add(line.tax)
            .ok_or_else(|| line_error(index, out_of_range()))?;
    }
    let total = subtotal
        .checked_add(tax)
        .ok_or_else(|| ServiceError::ValidationError("Order total is out of range".into()))?;
    Ok(OrderTotals {
        subtotal: money(subtotal),
        tax_amount: money(tax),
        total_amount: money(total),
    })
}

/// Purchase order with its lines
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetails {
    #[serde(flatten)]
    pub order: purchase_order::Model,
    pub order_number: String,
    pub items: Vec<purchase_order_item::Model>,
}

impl PurchaseOrderDetails {
    pub fn new(order: purchase_order::Model, items: Vec<purchase_order_item::Model>) -> Self {
        Self {
            order_number: order.order_number(),
            order,
            items,
        }
    }
}

/// Inserts the lines of an order in submission order
pub(crate) async fn insert_items<C>(
    db: &C,
    purchase_order_id: Uuid,
    items: &[PurchaseOrderItemInput],
) -> Result<Vec<purchase_order_item::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut saved = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let amounts = line_amounts(item).map_err(|e| line_error(index, e))?;
        let unit_price = decimal(item.unit_price, "unit_price").map_err(|e| line_error(index, e))?;
        let model = purchase_order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(purchase_order_id),
            position: Set(index as i32 + 1),
            material_id: Set(item.material_id),
            material_name: Set(item.material_name.trim().to_string()),
            quantity: Set(item.quantity),
            unit: Set(clean(item.unit.clone())),
            unit_price: Set(unit_price),
            tax_rate: Set(item.tax_rate),
            tax_exempt: Set(item.tax_exempt),
            discount_percent: Set(item.discount_percent),
            markup_percent: Set(item.markup_percent),
            line_total: Set(money(amounts.net)),
        }
        .insert(db)
        .await?;
        saved.push(model);
    }
    Ok(saved)
}

/// Takes the next purchase-order number of the account. Call inside the
/// transaction that inserts the order.
pub(crate) async fn next_sequence_number<C>(
    db: &C,
    ctx: &AccountContext,
) -> Result<i64, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let bumped = purchase_order_sequence::Entity::update_many()
        .col_expr(
            purchase_order_sequence::Column::LastValue,
            Expr::col(purchase_order_sequence::Column::LastValue).add(1),
        )
        .col_expr(purchase_order_sequence::Column::UpdatedAt, Expr::value(now))
        .filter(purchase_order_sequence::Column::AccountId.eq(ctx.account_id))
        .exec(db)
        .await?;

    if bumped.rows_affected == 0 {
        purchase_order_sequence::ActiveModel {
            account_id: Set(ctx.account_id),
            last_value: Set(1),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        return Ok(1);
    }

    let current = purchase_order_sequence::Entity::find_by_id(ctx.account_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::InternalError("Purchase order sequence vanished".into()))?;
    Ok(current.last_value)
}
