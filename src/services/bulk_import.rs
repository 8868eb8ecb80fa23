use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};

use crate::{
    auth::AccountContext,
    commands::suppliers::SupplierInput,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{PaymentTermsKind, SupplierStatus},
    services::{
        audit::{self, AuditAction, AuditEntry},
        materials::{MaterialInput, MaterialService},
        suppliers::{SupplierMaterialInput, SupplierService},
    },
};

/// One data row keyed by lower-cased header name
pub type ImportRow = BTreeMap<String, String>;

/// Data row with the spreadsheet row it came from; the header is row 1
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedRow {
    pub row: usize,
    pub fields: ImportRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ImportKind {
    Suppliers,
    Materials,
    #[strum(to_string = "supplier_materials", serialize = "supplier-materials")]
    SupplierMaterials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// Spreadsheet row number; the header is row 1
    pub row: usize,
    pub data: serde_json::Value,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<ImportRowError>,
    pub message: String,
}

/// Reads CSV text with a header row. Header names are trimmed and lower-cased;
/// empty cells are left out of the row. Rows are numbered by the file line
/// they start on, so blank lines and multi-line cells keep the numbering.
pub fn parse_csv(text: &str) -> Result<Vec<NumberedRow>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);
        let fields: ImportRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(NumberedRow { row, fields });
    }
    Ok(rows)
}

/// Converts JSON objects into import rows, stringifying scalar values.
/// Object `n` (zero-based) is numbered as spreadsheet row `n + 2`.
pub fn rows_from_json(
    objects: Vec<serde_json::Map<String, serde_json::Value>>,
) -> Vec<NumberedRow> {
    objects
        .into_iter()
        .enumerate()
        .map(|(index, object)| {
            let fields = object
                .into_iter()
                .filter_map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::Null => return None,
                        serde_json::Value::String(s) => s.trim().to_string(),
                        other => other.to_string(),
                    };
                    (!text.is_empty()).then(|| (key.trim().to_lowercase(), text))
                })
                .collect();
            NumberedRow {
                row: index + 2,
                fields,
            }
        })
        .collect()
}

fn field(row: &ImportRow, name: &str) -> Option<String> {
    row.get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(row: &ImportRow, name: &str) -> Result<String, String> {
    field(row, name).ok_or_else(|| format!("Missing required field: {}", name))
}

fn parse_field<T: FromStr>(row: &ImportRow, name: &str) -> Result<Option<T>, String> {
    field(row, name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| format!("Invalid value for {}: {}", name, raw))
        })
        .transpose()
}

fn supplier_input(row: &ImportRow) -> Result<SupplierInput, String> {
    Ok(SupplierInput {
        rif: required(row, "rif")?,
        name: required(row, "name")?,
        contact_name: field(row, "contact_name"),
        email: field(row, "email"),
        phone: field(row, "phone"),
        address: field(row, "address"),
        payment_terms: parse_field::<PaymentTermsKind>(row, "payment_terms")?
            .unwrap_or(PaymentTermsKind::Cash),
        credit_days: parse_field::<i32>(row, "credit_days")?,
        custom_payment_terms: field(row, "custom_payment_terms"),
        status: parse_field::<SupplierStatus>(row, "status")?,
    })
}

fn material_input(row: &ImportRow) -> Result<MaterialInput, String> {
    Ok(MaterialInput {
        name: required(row, "name")?,
        unit: field(row, "unit"),
        category: field(row, "category"),
        description: field(row, "description"),
    })
}

/// Messages shown next to a failed row; internal failures stay generic.
fn row_reason(error: ServiceError) -> String {
    match error {
        ServiceError::ValidationError(msg)
        | ServiceError::InvalidOperation(msg)
        | ServiceError::NotFound(msg)
        | ServiceError::Conflict(msg) => msg,
        other => other.response_message(),
    }
}

#[derive(Clone)]
pub struct BulkImportService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    suppliers: SupplierService,
    materials: MaterialService,
}

impl BulkImportService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        suppliers: SupplierService,
        materials: MaterialService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            suppliers,
            materials,
        }
    }

    /// Processes rows one by one. Failed rows are reported and skipped; rows
    /// already written stay written.
    #[instrument(skip(self, ctx, rows), fields(account_id = %ctx.account_id, rows = rows.len()))]
    pub async fn import(
        &self,
        ctx: &AccountContext,
        kind: ImportKind,
        rows: Vec<NumberedRow>,
    ) -> Result<ImportResult, ServiceError> {
        if rows.is_empty() {
            return Err(ServiceError::ValidationError(
                "The import contains no data rows".to_string(),
            ));
        }

        let mut result = ImportResult::default();
        for NumberedRow { row, fields } in &rows {
            let outcome = match kind {
                ImportKind::Suppliers => self.import_supplier(ctx, fields).await,
                ImportKind::Materials => self.import_material(ctx, fields).await,
                ImportKind::SupplierMaterials => self.import_relation(ctx, fields).await,
            };
            match outcome {
                Ok(()) => result.success_count += 1,
                Err(reason) => {
                    warn!(row, %reason, "Import row rejected");
                    result.failure_count += 1;
                    result.errors.push(ImportRowError {
                        row: *row,
                        data: json!(fields),
                        reason,
                    });
                }
            }
        }

        result.message = format!(
            "Imported {} of {} {} rows",
            result.success_count,
            rows.len(),
            kind
        );

        audit::record(
            &*self.db_pool,
            ctx,
            AuditEntry::new(AuditAction::BulkImport, &kind.to_string(), result.message.clone())
                .details(json!({
                    "success_count": result.success_count,
                    "failure_count": result.failure_count,
                })),
        )
        .await;
        self.event_sender
            .send_or_log(Event::BulkImportCompleted {
                kind: kind.to_string(),
                success_count: result.success_count,
                failure_count: result.failure_count,
            })
            .await;

        metrics::counter!("procurement_import.rows_succeeded", result.success_count as u64);
        metrics::counter!("procurement_import.rows_failed", result.failure_count as u64);
        info!(
            success = result.success_count,
            failed = result.failure_count,
            "Bulk import finished"
        );

        Ok(result)
    }

    async fn import_supplier(&self, ctx: &AccountContext, row: &ImportRow) -> Result<(), String> {
        let input = supplier_input(row)?;
        let existing = match field(row, "code") {
            Some(code) => self
                .suppliers
                .find_by_code(ctx, &code)
                .await
                .map_err(row_reason)?,
            None => None,
        };

        match existing {
            Some(current) => {
                let outcome = self
                    .suppliers
                    .update(ctx, current.id, input)
                    .await
                    .map_err(row_reason)?;
                if let Some(warning) = outcome.warning {
                    warn!(supplier_id = %current.id, %warning, "Imported deactivation left documents open");
                }
            }
            None => {
                self.suppliers.create(ctx, input).await.map_err(row_reason)?;
            }
        }
        Ok(())
    }

    async fn import_material(&self, ctx: &AccountContext, row: &ImportRow) -> Result<(), String> {
        let input = material_input(row)?;
        let existing = match field(row, "code") {
            Some(code) => self
                .materials
                .find_by_code(ctx, &code)
                .await
                .map_err(row_reason)?,
            None => None,
        };

        let saved = match existing {
            Some(current) => self.materials.update(ctx, current.id, input).await,
            None => self.materials.create(ctx, input).await,
        };
        saved.map(|_| ()).map_err(row_reason)
    }

    async fn import_relation(&self, ctx: &AccountContext, row: &ImportRow) -> Result<(), String> {
        let supplier_code = required(row, "supplier_code")?;
        let material_code = required(row, "material_code")?;

        let supplier = self
            .suppliers
            .find_by_code(ctx, &supplier_code)
            .await
            .map_err(row_reason)?
            .ok_or_else(|| format!("Unknown supplier code: {}", supplier_code))?;
        let material = self
            .materials
            .find_by_code(ctx, &material_code)
            .await
            .map_err(row_reason)?
            .ok_or_else(|| format!("Unknown material code: {}", material_code))?;

        self.suppliers
            .upsert_material(
                ctx,
                supplier.id,
                SupplierMaterialInput {
                    material_id: material.id,
                    specification: field(row, "specification"),
                },
            )
            .await
            .map(|_| ())
            .map_err(row_reason)
    }
}
