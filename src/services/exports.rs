use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument};

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    models::{material, supplier},
};

/// Header rows match the bulk-import columns, so an export can be re-imported as is.
pub const SUPPLIER_COLUMNS: [&str; 11] = [
    "code",
    "rif",
    "name",
    "contact_name",
    "email",
    "phone",
    "address",
    "payment_terms",
    "credit_days",
    "custom_payment_terms",
    "status",
];

pub const MATERIAL_COLUMNS: [&str; 5] = ["code", "name", "unit", "category", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExportKind {
    Suppliers,
    Materials,
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ServiceError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::SerializationError(e.to_string()))
}

pub fn suppliers_csv(suppliers: &[supplier::Model]) -> Result<String, ServiceError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(SUPPLIER_COLUMNS)?;
    for s in suppliers {
        writer.write_record([
            s.code.clone(),
            s.rif.clone(),
            s.name.clone(),
            opt(&s.contact_name),
            opt(&s.email),
            opt(&s.phone),
            opt(&s.address),
            s.payment_terms.to_string(),
            s.credit_days.map(|d| d.to_string()).unwrap_or_default(),
            opt(&s.custom_payment_terms),
            s.status.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn materials_csv(materials: &[material::Model]) -> Result<String, ServiceError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(MATERIAL_COLUMNS)?;
    for m in materials {
        writer.write_record([
            m.code.clone(),
            m.name.clone(),
            opt(&m.unit),
            opt(&m.category),
            opt(&m.description),
        ])?;
    }
    finish(writer)
}

#[derive(Clone)]
pub struct ExportService {
    db_pool: Arc<DbPool>,
}

impl ExportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn export(&self, ctx: &AccountContext, kind: ExportKind) -> Result<String, ServiceError> {
        let db = &*self.db_pool;
        let csv = match kind {
            ExportKind::Suppliers => {
                let rows = supplier::Entity::find()
                    .filter(supplier::Column::AccountId.eq(ctx.account_id))
                    .order_by_asc(supplier::Column::Code)
                    .all(db)
                    .await?;
                info!(rows = rows.len(), "Exporting suppliers");
                suppliers_csv(&rows)?
            }
            ExportKind::Materials => {
                let rows = material::Entity::find()
                    .filter(material::Column::AccountId.eq(ctx.account_id))
                    .order_by_asc(material::Column::Code)
                    .all(db)
                    .await?;
                info!(rows = rows.len(), "Exporting materials");
                materials_csv(&rows)?
            }
        };
        Ok(csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentTermsKind, SupplierStatus};
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    #[test]
    fn supplier_rows_quote_embedded_commas() {
        let now = Utc::now();
        let row = supplier::Model {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            code: "P001".into(),
            rif: "J-12345678-9".into(),
            name: "Hierros, C.A.".into(),
            contact_name: None,
            email: Some("ventas@hierros.com".into()),
            phone: None,
            address: None,
            payment_terms: PaymentTermsKind::Credit,
            credit_days: Some(30),
            custom_payment_terms: None,
            status: SupplierStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let csv = suppliers_csv(&[row]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), SUPPLIER_COLUMNS.join(","));
        let data = lines.next().unwrap();
        assert!(data.starts_with("P001,J-12345678-9,\"Hierros, C.A.\""));
        assert!(data.contains(",Crédito,30,"));
    }

    #[test]
    fn kind_parses_from_path_segment() {
        assert_eq!(ExportKind::from_str("suppliers").unwrap(), ExportKind::Suppliers);
        assert_eq!(ExportKind::from_str("Materials").unwrap(), ExportKind::Materials);
        assert!(ExportKind::from_str("orders").is_err());
    }
}
