use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote_request_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub quote_request_id: Uuid,
    pub position: i32,
    pub material_id: Option<Uuid>,
    pub material_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quote_request::Entity",
        from = "Column::QuoteRequestId",
        to = "super::quote_request::Column::Id",
        on_delete = "Cascade"
    )]
    QuoteRequest,
}

impl Related<super::quote_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuoteRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
