use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{PaymentTerms, PaymentTermsKind, SupplierStatus};

/// Code prefix for generated supplier codes (`P001`, `P002`, ...)
pub const CODE_PREFIX: &str = "P";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub account_id: Uuid,
    pub code: String,
    pub rif: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_terms: PaymentTermsKind,
    pub credit_days: Option<i32>,
    pub custom_payment_terms: Option<String>,
    pub status: SupplierStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Payment terms re-assembled from their three columns.
    /// Falls back to cash for rows written before the invariant was enforced.
    pub fn terms(&self) -> PaymentTerms {
        PaymentTerms::from_parts(
            self.payment_terms,
            self.credit_days,
            self.custom_payment_terms.as_deref(),
        )
        .unwrap_or(PaymentTerms::Cash)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supplier_material::Entity")]
    SupplierMaterials,
    #[sea_orm(has_many = "super::quote_request::Entity")]
    QuoteRequests,
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::supplier_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierMaterials.def()
    }
}

impl Related<super::quote_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuoteRequests.def()
    }
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
