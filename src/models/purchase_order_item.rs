use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub purchase_order_id: Uuid,
    pub position: i32,
    pub material_id: Option<Uuid>,
    pub material_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Fraction, e.g. 0.16 for 16% IVA
    pub tax_rate: f64,
    pub tax_exempt: bool,
    pub discount_percent: Option<f64>,
    pub markup_percent: Option<f64>,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseOrder,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
