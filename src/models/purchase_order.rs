use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{Currency, DocumentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub account_id: Uuid,
    pub sequence_number: i64,
    pub supplier_id: Uuid,
    pub company_id: Uuid,
    pub quote_request_id: Option<Uuid>,
    pub currency: Currency,
    pub exchange_rate: Option<f64>,
    pub status: DocumentStatus,
    pub delivery_date: Option<NaiveDate>,
    pub observations: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Printed order number, e.g. `OC-000042`
    pub fn order_number(&self) -> String {
        format!("OC-{:06}", self.sequence_number)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::purchase_order_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::price_history::Entity")]
    PriceHistory,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::price_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
