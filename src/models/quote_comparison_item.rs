use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::Currency;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote_comparison_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub quote_comparison_id: Uuid,
    pub supplier_id: Uuid,
    pub material_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub currency: Currency,
    pub exchange_rate: Option<f64>,
    pub lead_time_days: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quote_comparison::Entity",
        from = "Column::QuoteComparisonId",
        to = "super::quote_comparison::Column::Id",
        on_delete = "Cascade"
    )]
    QuoteComparison,
}

impl Related<super::quote_comparison::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuoteComparison.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
